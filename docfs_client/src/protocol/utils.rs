//! Helpers de lectura y escritura de los campos fijos de una trama
use std::io::{Error, ErrorKind, Read};

/// Lee exactamente `N` bytes del stream, reanudando lecturas cortas.
pub fn read_exact<const N: usize, T: Read>(stream: &mut T) -> Result<[u8; N], Error> {
    let mut buf = [0u8; N];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Copia un texto a un campo fijo de `len` bytes rellenado con NUL.
///
/// # Retorna
/// - `Err(InvalidInput)` si el texto no entra en el campo
pub fn escribir_texto_fijo(destino: &mut Vec<u8>, texto: &str, len: usize) -> Result<(), Error> {
    let bytes = texto.as_bytes();
    if bytes.len() >= len {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("texto de {} bytes excede el campo de {len}", bytes.len()),
        ));
    }
    destino.extend_from_slice(bytes);
    destino.resize(destino.len() + (len - bytes.len()), 0u8);
    Ok(())
}

/// Interpreta un campo fijo terminado en NUL como texto UTF-8.
pub fn leer_texto_fijo(campo: &[u8]) -> Result<String, Error> {
    let fin = campo.iter().position(|b| *b == 0).unwrap_or(campo.len());
    String::from_utf8(campo[..fin].to_vec())
        .map_err(|_| Error::new(ErrorKind::InvalidData, "campo de texto no es UTF-8 valido"))
}

/// Lee un entero de 32 bits big-endian del stream.
pub fn leer_i32<T: Read>(stream: &mut T) -> Result<i32, Error> {
    let bytes = read_exact::<4, _>(stream)?;
    Ok(i32::from_be_bytes(bytes))
}

/// Lee una cadena prefijada por su longitud (u16 big-endian) del stream.
pub fn leer_cadena_prefijada<T: Read>(stream: &mut T) -> Result<String, Error> {
    let len = u16::from_be_bytes(read_exact::<2, _>(stream)?) as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|_| Error::new(ErrorKind::InvalidData, "cadena prefijada no es UTF-8 valido"))
}

/// Agrega una cadena prefijada por su longitud (u16 big-endian) al buffer.
///
/// # Retorna
/// - `Err(InvalidInput)` si la cadena supera los 65535 bytes
pub fn escribir_cadena_prefijada(destino: &mut Vec<u8>, texto: &str) -> Result<(), Error> {
    let bytes = texto.as_bytes();
    let len = u16::try_from(bytes.len())
        .map_err(|_| Error::new(ErrorKind::InvalidInput, "cadena demasiado larga"))?;
    destino.extend_from_slice(&len.to_be_bytes());
    destino.extend_from_slice(bytes);
    Ok(())
}

/// Recorta un texto para que entre en el payload de una trama, respetando
/// los limites de caracteres UTF-8.
pub fn recortar_payload(texto: &str) -> &str {
    use crate::protocol::constantes::MAX_DATA;
    if texto.len() <= MAX_DATA {
        return texto;
    }
    let mut corte = MAX_DATA;
    while corte > 0 && !texto.is_char_boundary(corte) {
        corte -= 1;
    }
    &texto[..corte]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test01_read_exact_consume_en_orden() {
        let datos: Vec<u8> = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let mut cursor = Cursor::new(datos.clone());

        let lectura1 = read_exact::<3, _>(&mut cursor).unwrap();
        let lectura2 = read_exact::<3, _>(&mut cursor).unwrap();
        assert_eq!(&datos[0..3], lectura1);
        assert_eq!(&datos[3..6], lectura2);
    }

    #[test]
    fn test02_texto_fijo_ida_y_vuelta() {
        let mut buf = Vec::new();
        escribir_texto_fijo(&mut buf, "informe.txt", 256).unwrap();
        assert_eq!(buf.len(), 256);
        assert_eq!(leer_texto_fijo(&buf).unwrap(), "informe.txt");
    }

    #[test]
    fn test03_texto_fijo_rechaza_desborde() {
        let mut buf = Vec::new();
        let largo = "x".repeat(16);
        assert!(escribir_texto_fijo(&mut buf, &largo, 16).is_err());
    }

    #[test]
    fn test04_cadena_prefijada_ida_y_vuelta() {
        let mut buf = Vec::new();
        escribir_cadena_prefijada(&mut buf, "nodo-1").unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(leer_cadena_prefijada(&mut cursor).unwrap(), "nodo-1");
    }

    #[test]
    fn test05_recortar_payload() {
        use crate::protocol::constantes::MAX_DATA;
        let corto = "hola";
        assert_eq!(recortar_payload(corto), "hola");
        let largo = "x".repeat(MAX_DATA + 100);
        assert_eq!(recortar_payload(&largo).len(), MAX_DATA);
    }
}
