pub mod persistencia;
