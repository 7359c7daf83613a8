//! Este modulo contiene la trama de largo fijo que viaja en cada mensaje
//! del sistema, y las funciones para enviarla y recibirla por un socket
use crate::protocol::codigo_resultado::CodigoResultado;
use crate::protocol::constantes::{MAX_DATA, MAX_IP, MAX_TEXTO, TRAMA_LEN};
use crate::protocol::opcode::Opcode;
use crate::protocol::protocol_trait::{DeserializeDFP, SerializeDFP};
use crate::protocol::utils::{escribir_texto_fijo, leer_i32, leer_texto_fijo};
use std::io::{Error, ErrorKind, Read, Write};

/// Registro de largo fijo intercambiado en cada mensaje logico.
///
/// Toda peticion y toda respuesta es una unica trama de [`TRAMA_LEN`] bytes.
/// Los enteros viajan en big-endian; los campos de texto son fijos,
/// terminados en NUL. La recepcion consume la trama completa antes de
/// retornar (semantica `MSG_WAITALL`).
///
/// # Campos
/// - `opcode`: operacion solicitada (crudo; ver [`Trama::operacion`]).
/// - `username`: usuario que origina el pedido.
/// - `filename`: archivo objetivo.
/// - `folder`: carpeta auxiliar (MOVE, VIEWFOLDER, CREATEFOLDER).
/// - `checkpoint_tag`: tag auxiliar de las operaciones de checkpoint.
/// - `sentence_num` / `word_index`: indices de la edicion por oraciones; las
///   respuestas de rango fuera de limite devuelven aqui el maximo vigente.
/// - `flags`: mascara de acceso (bit 0 lectura, bit 1 escritura) o flags de
///   VIEW.
/// - `request_id`: id de solicitud de acceso.
/// - `data`: payload de hasta [`MAX_DATA`] bytes.
/// - `result_code`: codigo de resultado de las respuestas (crudo; ver
///   [`Trama::resultado`]).
/// - `node_ip` / `node_port`: par del referral en las respuestas `SsInfo`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trama {
    pub opcode: i32,
    pub username: String,
    pub filename: String,
    pub folder: String,
    pub checkpoint_tag: String,
    pub sentence_num: i32,
    pub word_index: i32,
    pub flags: i32,
    pub request_id: i32,
    pub data: Vec<u8>,
    pub result_code: i32,
    pub node_ip: String,
    pub node_port: i32,
}

impl Trama {
    /// Crea una trama de pedido con el resto de los campos en cero.
    ///
    /// # Parametros
    /// * `opcode`: operacion solicitada
    /// * `username`: usuario que origina el pedido
    pub fn nueva(opcode: Opcode, username: &str) -> Trama {
        Trama {
            opcode: opcode.as_i32(),
            username: username.to_string(),
            filename: String::new(),
            folder: String::new(),
            checkpoint_tag: String::new(),
            sentence_num: 0,
            word_index: 0,
            flags: 0,
            request_id: 0,
            data: Vec::new(),
            result_code: 0,
            node_ip: String::new(),
            node_port: 0,
        }
    }

    /// Fija el archivo objetivo del pedido.
    pub fn con_archivo(mut self, filename: &str) -> Trama {
        self.filename = filename.to_string();
        self
    }

    /// Fija la carpeta auxiliar del pedido.
    pub fn con_carpeta(mut self, folder: &str) -> Trama {
        self.folder = folder.to_string();
        self
    }

    /// Fija el tag de checkpoint del pedido.
    pub fn con_tag(mut self, tag: &str) -> Trama {
        self.checkpoint_tag = tag.to_string();
        self
    }

    /// Fija el payload a partir de texto.
    pub fn con_data(mut self, data: &str) -> Trama {
        self.data = data.as_bytes().to_vec();
        self
    }

    /// Fija el payload a partir de bytes ya serializados.
    pub fn con_data_bytes(mut self, data: Vec<u8>) -> Trama {
        self.data = data;
        self
    }

    /// Operacion de la trama, si el valor crudo pertenece al protocolo.
    pub fn operacion(&self) -> Option<Opcode> {
        Opcode::from_i32(self.opcode)
    }

    /// Codigo de resultado de la trama, si el valor crudo es conocido.
    pub fn resultado(&self) -> Option<CodigoResultado> {
        CodigoResultado::from_i32(self.result_code)
    }

    /// Payload interpretado como texto UTF-8 (con perdida si no lo es).
    pub fn data_texto(&self) -> String {
        String::from_utf8_lossy(&self.data).to_string()
    }

    /// Arma la respuesta a este pedido con un codigo y una descripcion
    /// legible para el cliente.
    ///
    /// # Parametros
    /// * `codigo`: resultado de la operacion
    /// * `descripcion`: texto que el cliente puede mostrar tal cual
    pub fn responder(&self, codigo: CodigoResultado, descripcion: &str) -> Trama {
        let mut respuesta = self.clone();
        respuesta.result_code = codigo.as_i32();
        respuesta.data = descripcion.as_bytes().to_vec();
        respuesta
    }

    /// Arma la respuesta de referral que redirige al cliente a un nodo.
    ///
    /// # Parametros
    /// * `ip`: ip anunciada del nodo
    /// * `puerto`: puerto de clientes del nodo
    pub fn responder_referral(&self, ip: &str, puerto: u16) -> Trama {
        let mut respuesta = self.clone();
        respuesta.result_code = CodigoResultado::SsInfo.as_i32();
        respuesta.data = Vec::new();
        respuesta.node_ip = ip.to_string();
        respuesta.node_port = puerto as i32;
        respuesta
    }

    /// Verifica que todos los campos entren en el layout fijo.
    ///
    /// # Retorna
    /// - `Err(InvalidInput)` ante un campo de texto o payload desbordado
    fn validar(&self) -> Result<(), Error> {
        for (campo, max) in [
            (self.username.len(), MAX_TEXTO),
            (self.filename.len(), MAX_TEXTO),
            (self.folder.len(), MAX_TEXTO),
            (self.checkpoint_tag.len(), MAX_TEXTO),
            (self.node_ip.len(), MAX_IP),
        ] {
            if campo >= max {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "campo de texto excede el layout de la trama",
                ));
            }
        }
        if self.data.len() > MAX_DATA {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("payload de {} bytes excede el maximo {MAX_DATA}", self.data.len()),
            ));
        }
        Ok(())
    }
}

impl SerializeDFP for Trama {
    fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(TRAMA_LEN);
        bytes.extend_from_slice(&self.opcode.to_be_bytes());
        for (texto, len) in [
            (&self.username, MAX_TEXTO),
            (&self.filename, MAX_TEXTO),
            (&self.folder, MAX_TEXTO),
            (&self.checkpoint_tag, MAX_TEXTO),
        ] {
            // validar() corre antes de cada envio; aca solo rellenamos
            let _ = escribir_texto_fijo(&mut bytes, texto, len);
        }
        bytes.extend_from_slice(&self.sentence_num.to_be_bytes());
        bytes.extend_from_slice(&self.word_index.to_be_bytes());
        bytes.extend_from_slice(&self.flags.to_be_bytes());
        bytes.extend_from_slice(&self.request_id.to_be_bytes());
        bytes.extend_from_slice(&(self.data.len() as i32).to_be_bytes());
        bytes.extend_from_slice(&self.data);
        bytes.resize(bytes.len() + (MAX_DATA - self.data.len()), 0u8);
        bytes.extend_from_slice(&self.result_code.to_be_bytes());
        let _ = escribir_texto_fijo(&mut bytes, &self.node_ip, MAX_IP);
        bytes.extend_from_slice(&self.node_port.to_be_bytes());
        bytes
    }
}

impl DeserializeDFP for Trama {
    fn deserialize<T: Read>(stream: &mut T) -> std::io::Result<Self> {
        let opcode = leer_i32(stream)?;

        let mut textos = [const { String::new() }; 4];
        for texto in textos.iter_mut() {
            let campo = crate::protocol::utils::read_exact::<MAX_TEXTO, _>(stream)?;
            *texto = leer_texto_fijo(&campo)?;
        }
        let [username, filename, folder, checkpoint_tag] = textos;

        let sentence_num = leer_i32(stream)?;
        let word_index = leer_i32(stream)?;
        let flags = leer_i32(stream)?;
        let request_id = leer_i32(stream)?;
        let data_length = leer_i32(stream)?;
        if data_length < 0 || data_length as usize > MAX_DATA {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("largo de payload invalido: {data_length}"),
            ));
        }
        let mut campo_data = vec![0u8; MAX_DATA];
        stream.read_exact(&mut campo_data)?;
        campo_data.truncate(data_length as usize);

        let result_code = leer_i32(stream)?;
        let campo_ip = crate::protocol::utils::read_exact::<MAX_IP, _>(stream)?;
        let node_ip = leer_texto_fijo(&campo_ip)?;
        let node_port = leer_i32(stream)?;

        Ok(Trama {
            opcode,
            username,
            filename,
            folder,
            checkpoint_tag,
            sentence_num,
            word_index,
            flags,
            request_id,
            data: campo_data,
            result_code,
            node_ip,
            node_port,
        })
    }
}

/// Envia una trama completa por el stream.
///
/// # Parametros
/// * `stream`: socket por donde escribir
/// * `trama`: trama a enviar
///
/// # Errores
/// - `InvalidInput` si algun campo desborda el layout fijo
/// - errores de E/S del socket
pub fn escribir_trama<W: Write>(stream: &mut W, trama: &Trama) -> Result<(), Error> {
    trama.validar()?;
    stream.write_all(&trama.serialize())?;
    stream.flush()
}

/// Recibe una trama completa del stream, consumiendo sus [`TRAMA_LEN`]
/// bytes antes de retornar.
pub fn leer_trama<R: Read>(stream: &mut R) -> Result<Trama, Error> {
    Trama::deserialize(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn trama_de_prueba() -> Trama {
        let mut trama = Trama::nueva(Opcode::Write, "alice")
            .con_archivo("informe")
            .con_carpeta("docs/2024")
            .con_tag("v1")
            .con_data("Hola mundo.");
        trama.sentence_num = 3;
        trama.word_index = 7;
        trama.flags = 2;
        trama.request_id = 11;
        trama
    }

    #[test]
    fn test01_serializa_al_largo_fijo() {
        let bytes = trama_de_prueba().serialize();
        assert_eq!(bytes.len(), TRAMA_LEN);
    }

    #[test]
    fn test02_ida_y_vuelta_conserva_todos_los_campos() {
        let original = trama_de_prueba();
        let mut cursor = Cursor::new(original.serialize());
        let leida = Trama::deserialize(&mut cursor).unwrap();
        assert_eq!(leida, original);
        assert_eq!(leida.operacion(), Some(Opcode::Write));
        assert_eq!(leida.data_texto(), "Hola mundo.");
    }

    #[test]
    fn test03_respuesta_referral() {
        let pedido = trama_de_prueba();
        let respuesta = pedido.responder_referral("10.0.0.7", 9101);
        assert_eq!(respuesta.resultado(), Some(CodigoResultado::SsInfo));
        assert_eq!(respuesta.node_ip, "10.0.0.7");
        assert_eq!(respuesta.node_port, 9101);

        let mut cursor = Cursor::new(respuesta.serialize());
        let leida = Trama::deserialize(&mut cursor).unwrap();
        assert_eq!(leida, respuesta);
    }

    #[test]
    fn test04_rechaza_payload_desbordado() {
        let mut sobrecargada = trama_de_prueba();
        sobrecargada.data = vec![b'x'; MAX_DATA + 1];
        let mut sink = Vec::new();
        assert!(escribir_trama(&mut sink, &sobrecargada).is_err());
    }

    #[test]
    fn test05_rechaza_nombre_desbordado() {
        let mut sobrecargada = trama_de_prueba();
        sobrecargada.filename = "f".repeat(MAX_TEXTO);
        let mut sink = Vec::new();
        assert!(escribir_trama(&mut sink, &sobrecargada).is_err());
    }

    #[test]
    fn test06_payload_vacio_y_campos_vacios() {
        let original = Trama::nueva(Opcode::Heartbeat, "");
        let mut cursor = Cursor::new(original.serialize());
        let leida = Trama::deserialize(&mut cursor).unwrap();
        assert_eq!(leida, original);
        assert!(leida.data.is_empty());
    }

    #[test]
    fn test07_largo_de_payload_negativo_es_invalido() {
        let mut bytes = trama_de_prueba().serialize();
        // data_length vive despues del opcode, 4 textos fijos y 4 enteros
        let offset = 4 + 4 * MAX_TEXTO + 4 * 4;
        bytes[offset..offset + 4].copy_from_slice(&(-1i32).to_be_bytes());
        let mut cursor = Cursor::new(bytes);
        assert!(Trama::deserialize(&mut cursor).is_err());
    }
}
