//! Payloads tipados que viajan dentro del campo `data` de una trama
use crate::protocol::protocol_trait::{DeserializeDFP, SerializeDFP};
use crate::protocol::utils::{escribir_cadena_prefijada, leer_cadena_prefijada, leer_i32, read_exact};
use std::io::{Error, ErrorKind, Read};

/// Anuncio de un nodo de almacenamiento al registrarse en el coordinator.
///
/// Viaja serializado en el `data` de la trama `RegisterNode`: id del nodo,
/// ip anunciada, puerto de clientes, puerto de control y la lista de
/// archivos que el nodo ya tiene en disco.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistroNodo {
    pub id: String,
    pub ip: String,
    pub puerto_cliente: u16,
    pub puerto_control: u16,
    pub archivos: Vec<String>,
}

impl SerializeDFP for RegistroNodo {
    fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let _ = escribir_cadena_prefijada(&mut bytes, &self.id);
        let _ = escribir_cadena_prefijada(&mut bytes, &self.ip);
        bytes.extend_from_slice(&self.puerto_cliente.to_be_bytes());
        bytes.extend_from_slice(&self.puerto_control.to_be_bytes());
        bytes.extend_from_slice(&(self.archivos.len() as i32).to_be_bytes());
        for archivo in &self.archivos {
            let _ = escribir_cadena_prefijada(&mut bytes, archivo);
        }
        bytes
    }
}

impl DeserializeDFP for RegistroNodo {
    fn deserialize<T: Read>(stream: &mut T) -> std::io::Result<Self> {
        let id = leer_cadena_prefijada(stream)?;
        let ip = leer_cadena_prefijada(stream)?;
        let puerto_cliente = u16::from_be_bytes(read_exact::<2, _>(stream)?);
        let puerto_control = u16::from_be_bytes(read_exact::<2, _>(stream)?);
        let cantidad = leer_i32(stream)?;
        if !(0..=100_000).contains(&cantidad) {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("cantidad de archivos invalida: {cantidad}"),
            ));
        }
        let mut archivos = Vec::with_capacity(cantidad as usize);
        for _ in 0..cantidad {
            archivos.push(leer_cadena_prefijada(stream)?);
        }
        Ok(RegistroNodo {
            id,
            ip,
            puerto_cliente,
            puerto_control,
            archivos,
        })
    }
}

/// Estadisticas de un archivo calculadas por su nodo duenio.
///
/// Respuesta de los refrescos de INFO que el coordinator pide por el canal
/// de control antes de renderizar VIEW detallado o INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EstadisticasArchivo {
    pub size: i64,
    pub word_count: i32,
    pub char_count: i32,
}

impl EstadisticasArchivo {
    /// Calcula las estadisticas directamente desde el contenido.
    pub fn desde_contenido(contenido: &str) -> EstadisticasArchivo {
        EstadisticasArchivo {
            size: contenido.len() as i64,
            word_count: contenido.split_whitespace().count() as i32,
            char_count: contenido.chars().filter(|c| !c.is_whitespace()).count() as i32,
        }
    }
}

impl SerializeDFP for EstadisticasArchivo {
    fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(16);
        bytes.extend_from_slice(&self.size.to_be_bytes());
        bytes.extend_from_slice(&self.word_count.to_be_bytes());
        bytes.extend_from_slice(&self.char_count.to_be_bytes());
        bytes
    }
}

impl DeserializeDFP for EstadisticasArchivo {
    fn deserialize<T: Read>(stream: &mut T) -> std::io::Result<Self> {
        let size = i64::from_be_bytes(read_exact::<8, _>(stream)?);
        let word_count = leer_i32(stream)?;
        let char_count = leer_i32(stream)?;
        Ok(EstadisticasArchivo {
            size,
            word_count,
            char_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test01_registro_nodo_ida_y_vuelta() {
        let registro = RegistroNodo {
            id: "nodo-1".to_string(),
            ip: "192.168.0.5".to_string(),
            puerto_cliente: 9100,
            puerto_control: 10100,
            archivos: vec!["a.txt".to_string(), "docs/b.txt".to_string()],
        };
        let mut cursor = Cursor::new(registro.serialize());
        assert_eq!(RegistroNodo::deserialize(&mut cursor).unwrap(), registro);
    }

    #[test]
    fn test02_registro_sin_archivos() {
        let registro = RegistroNodo {
            id: "nodo-2".to_string(),
            ip: "127.0.0.1".to_string(),
            puerto_cliente: 9200,
            puerto_control: 10200,
            archivos: vec![],
        };
        let mut cursor = Cursor::new(registro.serialize());
        assert_eq!(RegistroNodo::deserialize(&mut cursor).unwrap(), registro);
    }

    #[test]
    fn test03_estadisticas_desde_contenido() {
        let stats = EstadisticasArchivo::desde_contenido("Hola mundo .\n");
        assert_eq!(stats.size, 13);
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.char_count, 10);

        let mut cursor = Cursor::new(stats.serialize());
        assert_eq!(EstadisticasArchivo::deserialize(&mut cursor).unwrap(), stats);
    }
}
