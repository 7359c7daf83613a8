pub mod accesos;
pub mod archivos_ops;
pub mod carpetas_ops;
pub mod checkpoints_ops;
pub mod listados;
pub mod procesamiento;
pub mod utils;
