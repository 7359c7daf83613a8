pub mod archivos;
pub mod bloqueos;
pub mod clientes;
pub mod constantes;
pub mod control;
pub mod errores;
pub mod log_msj;
pub mod node;
pub mod node_builder;
pub mod oraciones;
pub mod registro;
