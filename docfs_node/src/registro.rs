//! Este modulo contiene el alta del nodo ante el coordinator y el
//! descubrimiento de la ip anunciable
use crate::constantes::DIRECCION_DESCUBRIMIENTO;
use crate::errores::NodeError;
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::payloads::RegistroNodo;
use docfs_client::protocol::protocol_trait::SerializeDFP;
use docfs_client::protocol::trama::{Trama, escribir_trama, leer_trama};
use std::net::{TcpStream, UdpSocket};

/// Descubre la ip local anunciable abriendo un socket UDP hacia una
/// direccion ruteable y leyendo el extremo local; nunca se envia nada.
///
/// # Retorna
/// - La ip local como texto, o `127.0.0.1` si el descubrimiento falla
pub fn descubrir_ip_local() -> String {
    let descubierta = UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect(DIRECCION_DESCUBRIMIENTO)?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string());
    descubierta.unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Registra el nodo ante el coordinator y devuelve el socket aceptado, que
/// queda como canal de control permanente.
///
/// # Parametros
/// * `direccion`: `ip:puerto` de clientes del coordinator
/// * `registro`: anuncio con id, ip, puertos y archivos ya presentes
///
/// # Retorna
/// - `Ok(TcpStream)` con el canal de control establecido
/// - `Err(NodeError)` si la conexion falla o el registro es rechazado
pub fn registrar_en_coordinator(
    direccion: &str,
    registro: &RegistroNodo,
) -> Result<TcpStream, NodeError> {
    let mut stream = TcpStream::connect(direccion)
        .map_err(|e| NodeError::new_conexion_error(e.to_string(), "REGISTRO"))?;

    let trama = Trama::nueva(Opcode::RegisterNode, "system")
        .con_data_bytes(registro.serialize());
    escribir_trama(&mut stream, &trama)
        .map_err(|e| NodeError::new_conexion_error(e.to_string(), "REGISTRO"))?;

    let respuesta = leer_trama(&mut stream)
        .map_err(|e| NodeError::new_conexion_error(e.to_string(), "REGISTRO"))?;

    match respuesta.resultado() {
        Some(codigo) if codigo.es_exito() => Ok(stream),
        _ => Err(NodeError::new_registro_error(
            respuesta.data_texto(),
            "REGISTRO",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_descubrir_ip_devuelve_algo_parseable() {
        let ip = descubrir_ip_local();
        assert!(ip.parse::<std::net::IpAddr>().is_ok());
    }
}
