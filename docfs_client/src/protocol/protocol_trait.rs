use std::io::Read;

/// Trait para serializar estructuras al protocolo de tramas del filesystem
/// de documentos (DFP).
///
/// Proporciona una funcion para convertir una instancia en la secuencia de
/// bytes que la representa sobre el socket.
pub trait SerializeDFP {
    /// Serializa la instancia en un vector de bytes conforme al protocolo.
    fn serialize(&self) -> Vec<u8>;
}

/// Trait para deserializar estructuras desde el protocolo de tramas del
/// filesystem de documentos (DFP).
///
/// Proporciona una funcion para leer bytes desde un stream y construir una
/// instancia del tipo correspondiente.
pub trait DeserializeDFP {
    /// Deserializa una instancia del tipo desde el stream de bytes.
    ///
    /// # Errores
    /// Retorna un `std::io::Error` si la lectura falla o los datos son
    /// invalidos.
    fn deserialize<T: Read>(stream: &mut T) -> std::io::Result<Self>
    where
        Self: Sized;
}
