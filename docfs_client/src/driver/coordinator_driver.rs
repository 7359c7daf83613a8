//! Este modulo contiene el driver de la conexion de un cliente con el
//! coordinator: registra la sesion y expone un metodo por operacion
use crate::driver::DriverResult;
use crate::driver::driver_error::{DriverError, DriverErrorKind};
use crate::protocol::codigo_resultado::CodigoResultado;
use crate::protocol::constantes::{ACCESO_ESCRITURA, ACCESO_LECTURA, VIEW_DETALLE, VIEW_TODOS};
use crate::protocol::opcode::Opcode;
use crate::protocol::trama::{Trama, escribir_trama, leer_trama};
use std::net::TcpStream;

/// Respuesta del coordinator a un pedido de contenido: o bien el contenido
/// inline (camino de fallback con cache/backup), o bien un referral al nodo
/// duenio para abrir un canal de datos directo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolucion {
    Contenido(String),
    Referral { ip: String, puerto: u16 },
}

/// This struct will be used as an interface between the user and the
/// coordinator.
#[derive(Debug)]
pub struct CoordinatorDriver {
    /// Contains the connection to the coordinator
    connection: TcpStream,
    /// Usuario con el que se registro la sesion
    username: String,
    /// Mensaje de bienvenida devuelto por el coordinator
    welcome: String,
}

impl CoordinatorDriver {
    /// Conecta con el coordinator y registra la sesion del usuario.
    ///
    /// # Parametros
    /// * `hostname`: host del coordinator
    /// * `port`: puerto de clientes del coordinator
    /// * `username`: usuario a registrar; si ya tiene una sesion activa en
    ///   el cluster el registro es rechazado
    ///
    /// # Retorna
    /// - `Ok(CoordinatorDriver)` con la sesion registrada
    /// - `Err` de tipo `HandshakeError` si la sesion fue rechazada, con la
    ///   descripcion de la sesion preexistente
    pub fn connect(hostname: &str, port: u16, username: &str) -> DriverResult<Self> {
        let mut stream = TcpStream::connect(format!("{hostname}:{port}"))?;

        let registro = Trama::nueva(Opcode::RegisterClient, username);
        escribir_trama(&mut stream, &registro)?;
        let respuesta = leer_trama(&mut stream)?;

        match respuesta.resultado() {
            Some(CodigoResultado::Success) => Ok(CoordinatorDriver {
                connection: stream,
                username: username.to_string(),
                welcome: respuesta.data_texto(),
            }),
            Some(_) => Err(DriverError::new(
                respuesta.data_texto(),
                DriverErrorKind::HandshakeError,
            )),
            None => Err(DriverError::new(
                format!("codigo de resultado desconocido: {}", respuesta.result_code),
                DriverErrorKind::ProtocolError,
            )),
        }
    }

    /// Usuario de la sesion.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Mensaje de bienvenida que devolvio el registro.
    pub fn welcome(&self) -> &str {
        &self.welcome
    }

    /// Envia un pedido y espera su respuesta en la misma conexion.
    fn pedir(&mut self, trama: &Trama) -> DriverResult<Trama> {
        escribir_trama(&mut self.connection, trama)?;
        Ok(leer_trama(&mut self.connection)?)
    }

    /// Envia un pedido y exige una respuesta de la franja de exitos.
    fn pedir_exito(&mut self, trama: &Trama) -> DriverResult<Trama> {
        let respuesta = self.pedir(trama)?;
        exigir_exito(respuesta)
    }

    /// Arma la trama base de un pedido de esta sesion.
    fn pedido(&self, opcode: Opcode) -> Trama {
        Trama::nueva(opcode, &self.username)
    }

    /// Crea un archivo nuevo en el cluster.
    ///
    /// # Parametros
    /// * `archivo`: nombre globalmente unico
    /// * `nodo`: id del nodo destino; `None` deja elegir al coordinator
    pub fn crear(&mut self, archivo: &str, nodo: Option<&str>) -> DriverResult<String> {
        let mut trama = self.pedido(Opcode::Create).con_archivo(archivo);
        if let Some(id) = nodo {
            trama = trama.con_data(id);
        }
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Resuelve una lectura: contenido inline o referral al nodo duenio.
    pub fn leer(&mut self, archivo: &str) -> DriverResult<Resolucion> {
        let trama = self.pedido(Opcode::Read).con_archivo(archivo);
        let respuesta = self.pedir_exito(&trama)?;
        Ok(resolucion_de(respuesta))
    }

    /// Resuelve un stream: contenido inline o referral al nodo duenio.
    pub fn stream(&mut self, archivo: &str) -> DriverResult<Resolucion> {
        let trama = self.pedido(Opcode::Stream).con_archivo(archivo);
        let respuesta = self.pedir_exito(&trama)?;
        Ok(resolucion_de(respuesta))
    }

    /// Pide el referral para una sesion de escritura sobre una oracion.
    ///
    /// # Retorna
    /// - `(ip, puerto)` del nodo duenio para abrir el canal de datos
    pub fn escribir(&mut self, archivo: &str, oracion: u32) -> DriverResult<(String, u16)> {
        let mut trama = self.pedido(Opcode::Write).con_archivo(archivo);
        trama.sentence_num = oracion as i32;
        let respuesta = self.pedir_exito(&trama)?;
        Ok((respuesta.node_ip.clone(), respuesta.node_port as u16))
    }

    /// Pide el referral para deshacer la ultima escritura de un archivo.
    pub fn deshacer(&mut self, archivo: &str) -> DriverResult<(String, u16)> {
        let trama = self.pedido(Opcode::Undo).con_archivo(archivo);
        let respuesta = self.pedir_exito(&trama)?;
        Ok((respuesta.node_ip.clone(), respuesta.node_port as u16))
    }

    /// Borra un archivo; solo el duenio puede hacerlo.
    pub fn borrar(&mut self, archivo: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::Delete).con_archivo(archivo);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Lista los archivos visibles.
    ///
    /// # Parametros
    /// * `todos`: incluye los archivos sin acceso, marcados `[-]`
    /// * `detalle`: listado largo con marcador de acceso y estadisticas
    pub fn ver(&mut self, todos: bool, detalle: bool) -> DriverResult<String> {
        let mut trama = self.pedido(Opcode::View);
        if todos {
            trama.flags |= VIEW_TODOS;
        }
        if detalle {
            trama.flags |= VIEW_DETALLE;
        }
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Metadata de un archivo.
    pub fn info(&mut self, archivo: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::Info).con_archivo(archivo);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Otorga o promueve el acceso de un usuario a un archivo propio.
    ///
    /// # Parametros
    /// * `archivo`: archivo del que el llamador es duenio
    /// * `usuario`: usuario registrado a autorizar
    /// * `escritura`: otorga escritura (que implica lectura)
    pub fn agregar_acceso(
        &mut self,
        archivo: &str,
        usuario: &str,
        escritura: bool,
    ) -> DriverResult<String> {
        let mut trama = self.pedido(Opcode::AddAccess).con_archivo(archivo).con_data(usuario);
        trama.flags = if escritura {
            ACCESO_LECTURA | ACCESO_ESCRITURA
        } else {
            ACCESO_LECTURA
        };
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Revoca el acceso de un usuario a un archivo propio.
    pub fn remover_acceso(&mut self, archivo: &str, usuario: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::RemAccess).con_archivo(archivo).con_data(usuario);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Solicita acceso a un archivo ajeno.
    ///
    /// # Parametros
    /// * `archivo`: archivo objetivo
    /// * `mascara`: combinacion de [`ACCESO_LECTURA`] y [`ACCESO_ESCRITURA`]
    pub fn solicitar_acceso(&mut self, archivo: &str, mascara: i32) -> DriverResult<String> {
        let mut trama = self.pedido(Opcode::RequestAccess).con_archivo(archivo);
        trama.flags = mascara;
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Lista las solicitudes pendientes de un archivo propio.
    pub fn ver_solicitudes(&mut self, archivo: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::ViewRequests).con_archivo(archivo);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Aprueba o rechaza una solicitud de acceso de un archivo propio.
    ///
    /// # Parametros
    /// * `archivo`: archivo objetivo
    /// * `id`: id de la solicitud
    /// * `aprobar`: aprueba (actualizando la ACL) o rechaza
    pub fn responder_solicitud(
        &mut self,
        archivo: &str,
        id: i32,
        aprobar: bool,
    ) -> DriverResult<String> {
        let mut trama = self.pedido(Opcode::RespondRequest).con_archivo(archivo);
        trama.request_id = id;
        trama.flags = if aprobar { 1 } else { 0 };
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Lista los usuarios registrados en el cluster.
    pub fn listar_usuarios(&mut self) -> DriverResult<String> {
        let trama = self.pedido(Opcode::ListUsers);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Lista los nodos de almacenamiento conocidos y su estado.
    pub fn listar_nodos(&mut self) -> DriverResult<String> {
        let trama = self.pedido(Opcode::ListNodes);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Busca archivos legibles por el usuario segun un patron.
    pub fn buscar(&mut self, patron: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::Search).con_data(patron);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Crea una carpeta (y sus ancestros faltantes) en la metadata.
    pub fn crear_carpeta(&mut self, ruta: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::CreateFolder).con_carpeta(ruta);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Lista los archivos de una carpeta.
    pub fn ver_carpeta(&mut self, ruta: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::ViewFolder).con_carpeta(ruta);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Mueve un archivo a otra carpeta; requiere permiso de escritura.
    pub fn mover(&mut self, archivo: &str, carpeta: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::Move).con_archivo(archivo).con_carpeta(carpeta);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Crea un checkpoint etiquetado del archivo.
    pub fn checkpoint(&mut self, archivo: &str, tag: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::Checkpoint).con_archivo(archivo).con_tag(tag);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Muestra el contenido de un checkpoint.
    pub fn ver_checkpoint(&mut self, archivo: &str, tag: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::ViewCheckpoint).con_archivo(archivo).con_tag(tag);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Restaura el archivo vivo desde un checkpoint.
    pub fn revertir(&mut self, archivo: &str, tag: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::Revert).con_archivo(archivo).con_tag(tag);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Lista los checkpoints registrados de un archivo.
    pub fn listar_checkpoints(&mut self, archivo: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::ListCheckpoints).con_archivo(archivo);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }

    /// Ejecuta el contenido de un archivo como script en el coordinator y
    /// devuelve la salida combinada. Disponible solo si el coordinator fue
    /// compilado con la feature `exec`.
    pub fn exec(&mut self, archivo: &str) -> DriverResult<String> {
        let trama = self.pedido(Opcode::Exec).con_archivo(archivo);
        Ok(self.pedir_exito(&trama)?.data_texto())
    }
}

/// Clasifica una respuesta exitosa de contenido en inline o referral.
fn resolucion_de(respuesta: Trama) -> Resolucion {
    if respuesta.resultado() == Some(CodigoResultado::SsInfo) {
        Resolucion::Referral {
            ip: respuesta.node_ip.clone(),
            puerto: respuesta.node_port as u16,
        }
    } else {
        Resolucion::Contenido(respuesta.data_texto())
    }
}

/// Convierte las respuestas de error en `DriverError`, preservando el
/// maximo vigente de los errores de rango.
pub(crate) fn exigir_exito(respuesta: Trama) -> DriverResult<Trama> {
    match respuesta.resultado() {
        Some(codigo) if codigo.es_exito() => Ok(respuesta),
        Some(codigo) => {
            let limite = match codigo {
                CodigoResultado::SentenceOutOfRange | CodigoResultado::WordOutOfRange => {
                    Some(respuesta.word_index)
                }
                _ => None,
            };
            Err(DriverError::servidor(codigo, respuesta.data_texto(), limite))
        }
        None => Err(DriverError::new(
            format!("codigo de resultado desconocido: {}", respuesta.result_code),
            DriverErrorKind::ProtocolError,
        )),
    }
}
