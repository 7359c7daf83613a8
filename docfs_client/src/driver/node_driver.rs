//! Este modulo contiene el driver del canal de datos entre un cliente y un
//! nodo de almacenamiento: lecturas, stream, undo y la sesion interactiva
//! de escritura por oraciones
use crate::driver::DriverResult;
use crate::driver::coordinator_driver::exigir_exito;
use crate::driver::driver_error::{DriverError, DriverErrorKind};
use crate::protocol::codigo_resultado::CodigoResultado;
use crate::protocol::constantes::TOKEN_CIERRE_ESCRITURA;
use crate::protocol::opcode::Opcode;
use crate::protocol::trama::{Trama, escribir_trama, leer_trama};
use std::net::TcpStream;

/// Canal de datos de corta vida contra un nodo de almacenamiento, abierto
/// a partir de un referral del coordinator.
#[derive(Debug)]
pub struct NodeDriver {
    /// Contains the connection to the storage node
    connection: TcpStream,
}

impl NodeDriver {
    /// Abre el canal de datos contra el nodo referido.
    ///
    /// # Parametros
    /// * `ip`: ip del referral
    /// * `puerto`: puerto de clientes del referral
    pub fn connect(ip: &str, puerto: u16) -> DriverResult<Self> {
        let stream = TcpStream::connect(format!("{ip}:{puerto}"))?;
        Ok(NodeDriver { connection: stream })
    }

    /// Lee el contenido completo de un archivo del nodo.
    pub fn leer(&mut self, usuario: &str, archivo: &str) -> DriverResult<String> {
        let trama = Trama::nueva(Opcode::Read, usuario).con_archivo(archivo);
        escribir_trama(&mut self.connection, &trama)?;
        let respuesta = exigir_exito(leer_trama(&mut self.connection)?)?;
        Ok(respuesta.data_texto())
    }

    /// Recibe el archivo palabra por palabra.
    ///
    /// El nodo envia una trama `Data` por palabra (con tramas centinela
    /// `"\n"` en los saltos de linea) y cierra con una trama `Success`.
    ///
    /// # Parametros
    /// * `usuario`: usuario del pedido
    /// * `archivo`: archivo a recibir
    /// * `entregar`: callback invocado con cada palabra en orden
    pub fn stream<F>(&mut self, usuario: &str, archivo: &str, mut entregar: F) -> DriverResult<()>
    where
        F: FnMut(&str),
    {
        let trama = Trama::nueva(Opcode::Stream, usuario).con_archivo(archivo);
        escribir_trama(&mut self.connection, &trama)?;

        loop {
            let respuesta = leer_trama(&mut self.connection)?;
            match respuesta.resultado() {
                Some(CodigoResultado::Data) => entregar(&respuesta.data_texto()),
                Some(CodigoResultado::Success) => return Ok(()),
                Some(codigo) => {
                    return Err(DriverError::servidor(codigo, respuesta.data_texto(), None));
                }
                None => {
                    return Err(DriverError::new(
                        format!("codigo de resultado desconocido: {}", respuesta.result_code),
                        DriverErrorKind::ProtocolError,
                    ));
                }
            }
        }
    }

    /// Deshace la ultima escritura confirmada del archivo.
    ///
    /// Falla con `Denied` si el ultimo cambio ya fue un undo.
    pub fn deshacer(&mut self, usuario: &str, archivo: &str) -> DriverResult<String> {
        let trama = Trama::nueva(Opcode::Undo, usuario).con_archivo(archivo);
        escribir_trama(&mut self.connection, &trama)?;
        let respuesta = exigir_exito(leer_trama(&mut self.connection)?)?;
        Ok(respuesta.data_texto())
    }

    /// Abre una sesion de escritura interactiva sobre una oracion.
    ///
    /// El nodo toma el lock de `(archivo, oracion)` y responde el texto
    /// actual de la oracion. Si la oracion esta tomada devuelve `Locked`
    /// con el nombre del holder como descripcion; si el indice esta fuera
    /// de rango devuelve `SentenceOutOfRange` con la cantidad vigente.
    ///
    /// # Retorna
    /// - `SesionEscritura` con la oracion bloqueada
    pub fn abrir_escritura(
        mut self,
        usuario: &str,
        archivo: &str,
        oracion: u32,
    ) -> DriverResult<SesionEscritura> {
        let mut trama = Trama::nueva(Opcode::Write, usuario).con_archivo(archivo);
        trama.sentence_num = oracion as i32;
        escribir_trama(&mut self.connection, &trama)?;
        let respuesta = exigir_exito(leer_trama(&mut self.connection)?)?;

        Ok(SesionEscritura {
            driver: self,
            usuario: usuario.to_string(),
            archivo: archivo.to_string(),
            oracion: oracion as i32,
            oracion_actual: respuesta.data_texto(),
        })
    }
}

/// Sesion interactiva de escritura sobre una oracion bloqueada.
///
/// Cada insercion viaja como una trama de actualizacion y el nodo responde
/// la oracion vigente (que puede haberse partido si la insercion introdujo
/// un delimitador). Nada se persiste hasta [`confirmar`](Self::confirmar);
/// soltar la sesion sin confirmar libera el lock y no toca el archivo.
#[derive(Debug)]
pub struct SesionEscritura {
    driver: NodeDriver,
    usuario: String,
    archivo: String,
    oracion: i32,
    oracion_actual: String,
}

impl SesionEscritura {
    /// Inserta una o mas palabras en la posicion indicada.
    ///
    /// # Parametros
    /// * `indice`: posicion de insercion, entre 0 y la cantidad actual de
    ///   palabras; fuera de ese rango el nodo responde `WordOutOfRange`
    ///   con la cantidad vigente
    /// * `texto`: contenido a tokenizar por espacios e insertar; el texto
    ///   vacio es un no-op que devuelve la oracion sin cambios
    ///
    /// # Retorna
    /// - El texto actualizado de la oracion en edicion
    pub fn insertar(&mut self, indice: u32, texto: &str) -> DriverResult<String> {
        let mut trama = Trama::nueva(Opcode::Write, &self.usuario)
            .con_archivo(&self.archivo)
            .con_data(texto);
        trama.sentence_num = self.oracion;
        trama.word_index = indice as i32;
        escribir_trama(&mut self.driver.connection, &trama)?;
        let respuesta = exigir_exito(leer_trama(&mut self.driver.connection)?)?;
        self.oracion_actual = respuesta.data_texto();
        Ok(self.oracion_actual.clone())
    }

    /// Confirma la sesion enviando el token de cierre.
    ///
    /// El nodo respalda el archivo anterior en el sidecar, reemplaza el
    /// contenido vivo en forma atomica, libera el lock y habilita un nuevo
    /// undo.
    ///
    /// # Retorna
    /// - El contenido completo del archivo ya persistido
    pub fn confirmar(mut self) -> DriverResult<String> {
        let mut trama = Trama::nueva(Opcode::Write, &self.usuario)
            .con_archivo(&self.archivo)
            .con_data(TOKEN_CIERRE_ESCRITURA);
        trama.sentence_num = self.oracion;
        escribir_trama(&mut self.driver.connection, &trama)?;
        let respuesta = exigir_exito(leer_trama(&mut self.driver.connection)?)?;
        Ok(respuesta.data_texto())
    }

    /// Texto vigente de la oracion en edicion.
    pub fn oracion_actual(&self) -> &str {
        &self.oracion_actual
    }
}
