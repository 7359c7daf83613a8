pub mod codigo_resultado;
pub mod constantes;
pub mod opcode;
pub mod payloads;
pub mod protocol_trait;
pub mod trama;
pub mod utils;
