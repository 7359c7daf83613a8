//! Este modulo contiene los codigos de operacion que viajan en las tramas
use std::fmt;

/// Operaciones del protocolo. Los valores numericos son parte del contrato
/// de interoperabilidad y no deben reordenarse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    RegisterNode = 1,
    RegisterClient = 2,
    Create = 10,
    Read = 11,
    Write = 12,
    Delete = 13,
    View = 14,
    Info = 15,
    Stream = 16,
    ListUsers = 17,
    AddAccess = 18,
    RemAccess = 19,
    Exec = 20,
    Undo = 21,
    Search = 22,
    CreateFolder = 23,
    Move = 24,
    ViewFolder = 25,
    Checkpoint = 26,
    ViewCheckpoint = 27,
    Revert = 28,
    ListCheckpoints = 29,
    RequestAccess = 30,
    ViewRequests = 31,
    RespondRequest = 32,
    Heartbeat = 33,
    Shutdown = 34,
    Replicate = 35,
    ListNodes = 36,
}

impl Opcode {
    /// Interpreta el entero de una trama recibida.
    ///
    /// # Retorna
    /// - `Some(Opcode)` si el valor corresponde a una operacion conocida
    /// - `None` para valores fuera del protocolo (el receptor debe responder
    ///   `BadRequest`)
    pub fn from_i32(valor: i32) -> Option<Opcode> {
        let op = match valor {
            1 => Opcode::RegisterNode,
            2 => Opcode::RegisterClient,
            10 => Opcode::Create,
            11 => Opcode::Read,
            12 => Opcode::Write,
            13 => Opcode::Delete,
            14 => Opcode::View,
            15 => Opcode::Info,
            16 => Opcode::Stream,
            17 => Opcode::ListUsers,
            18 => Opcode::AddAccess,
            19 => Opcode::RemAccess,
            20 => Opcode::Exec,
            21 => Opcode::Undo,
            22 => Opcode::Search,
            23 => Opcode::CreateFolder,
            24 => Opcode::Move,
            25 => Opcode::ViewFolder,
            26 => Opcode::Checkpoint,
            27 => Opcode::ViewCheckpoint,
            28 => Opcode::Revert,
            29 => Opcode::ListCheckpoints,
            30 => Opcode::RequestAccess,
            31 => Opcode::ViewRequests,
            32 => Opcode::RespondRequest,
            33 => Opcode::Heartbeat,
            34 => Opcode::Shutdown,
            35 => Opcode::Replicate,
            36 => Opcode::ListNodes,
            _ => return None,
        };
        Some(op)
    }

    /// Valor numerico con el que la operacion viaja por el socket.
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_ida_y_vuelta_de_todos_los_opcodes() {
        let opcodes = [
            Opcode::RegisterNode,
            Opcode::RegisterClient,
            Opcode::Create,
            Opcode::Read,
            Opcode::Write,
            Opcode::Delete,
            Opcode::View,
            Opcode::Info,
            Opcode::Stream,
            Opcode::ListUsers,
            Opcode::AddAccess,
            Opcode::RemAccess,
            Opcode::Exec,
            Opcode::Undo,
            Opcode::Search,
            Opcode::CreateFolder,
            Opcode::Move,
            Opcode::ViewFolder,
            Opcode::Checkpoint,
            Opcode::ViewCheckpoint,
            Opcode::Revert,
            Opcode::ListCheckpoints,
            Opcode::RequestAccess,
            Opcode::ViewRequests,
            Opcode::RespondRequest,
            Opcode::Heartbeat,
            Opcode::Shutdown,
            Opcode::Replicate,
            Opcode::ListNodes,
        ];
        for op in opcodes {
            assert_eq!(Opcode::from_i32(op.as_i32()), Some(op));
        }
    }

    #[test]
    fn test02_valor_desconocido_no_parsea() {
        assert_eq!(Opcode::from_i32(0), None);
        assert_eq!(Opcode::from_i32(99), None);
        assert_eq!(Opcode::from_i32(-5), None);
    }

    #[test]
    fn test03_valores_del_contrato() {
        assert_eq!(Opcode::RegisterNode.as_i32(), 1);
        assert_eq!(Opcode::Create.as_i32(), 10);
        assert_eq!(Opcode::ListNodes.as_i32(), 36);
    }
}
