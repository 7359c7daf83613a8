//! Este modulo contiene la implementacion de la estructura logger,
//! encargada de registrar mensajes al archivo de log de cada proceso
//! del sistema de archivos distribuido
use chrono;
use std::{
    fmt::Display,
    fs::OpenOptions,
    io::Write,
    sync::mpsc::{Receiver, Sender, channel},
    thread::spawn,
};

/// Nivel de severidad de un mensaje de log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NivelLog {
    Info,
    Warning,
    Error,
    Debug,
}

impl NivelLog {
    fn etiqueta(&self) -> &'static str {
        match self {
            NivelLog::Info => "INFO",
            NivelLog::Warning => "WARNING",
            NivelLog::Error => "ERROR",
            NivelLog::Debug => "DEBUG",
        }
    }
}

/// Struct to hold the logger sender
#[derive(Debug, Clone)]
pub struct Logger {
    /// Sender to send log messages
    pub logger: Sender<String>,
}

impl Logger {
    /// Constructor de la estructura.
    /// Mueve la escritura de mensajes a un hilo, permitiendo
    /// recibir mensajes y escribir simultaneamente
    /// # Parametros
    /// * `filename`: nombre del archivo donde escribir los mensajes
    pub fn new(filename: &str) -> Logger {
        let (logger, receiver) = channel();
        let filename = filename.to_string();

        spawn(move || {
            write_to_file(&filename, receiver);
        });

        Logger { logger }
    }

    /// Crea un logger que descarta todos los mensajes, util para tests
    pub fn null() -> Self {
        let (sender, receiver) = channel::<String>();
        spawn(move || for _ in receiver {});
        Self { logger: sender }
    }

    /// Registra un mensaje de tipo info
    /// # Parametros
    /// * `message`: mensaje a registrar
    /// * `module`: unidad logica del programa que emite la informacion
    pub fn info(&self, message: &str, module: &str) {
        self.registrar(NivelLog::Info, message, module);
    }

    /// Registra un mensaje de tipo error
    /// # Parametros
    /// * `message`: mensaje a registrar
    /// * `module`: unidad logica del programa donde se produjo el error
    pub fn error(&self, message: &str, module: &str) {
        self.registrar(NivelLog::Error, message, module);
    }

    /// Registra un mensaje de tipo warning
    /// # Parametros
    /// * `message`: mensaje a registrar
    /// * `module`: unidad logica del programa que emite la informacion
    pub fn warn(&self, message: &str, module: &str) {
        self.registrar(NivelLog::Warning, message, module);
    }

    /// Registra un mensaje de tipo debug con informacion adicional
    /// # Parametros
    /// * `message`: mensaje a registrar
    /// * `module`: unidad logica del programa que emite la informacion
    /// * `data`: informacion del caso particular
    pub fn debug<T: Display>(&self, message: &str, module: &str, data: T) {
        let mensaje = format!("{message} - {data}");
        self.registrar(NivelLog::Debug, &mensaje, module);
    }

    /// Arma la linea de log con timestamp y la envia al hilo escritor
    /// # Parametros
    /// * `nivel`: severidad del mensaje
    /// * `message`: mensaje a registrar
    /// * `module`: unidad logica del programa que emite la informacion
    fn registrar(&self, nivel: NivelLog, message: &str, module: &str) {
        let now = chrono::Local::now();
        let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let log_message = format!("[{}] - {timestamp} - {module}: {message}", nivel.etiqueta());
        if self.logger.send(log_message).is_err() {
            eprintln!("Error sending log message");
        }
    }
}

/// Recibe mensajes y los escribe en un archivo con el nombre recibido por
/// parametro
///
/// # Parametros
/// * `filename`: nombre del archivo a crear para registrar los mensajes
/// * `receiver`: extremo de recepcion del canal que comparte con la
///   estructura principal por donde recibe los mensajes
fn write_to_file(filename: &str, receiver: Receiver<String>) {
    let file = OpenOptions::new().create(true).append(true).open(filename);

    let mut file = match file {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error opening log file: {e}");
            return;
        }
    };

    for message in receiver {
        if let Err(e) = writeln!(file, "{message}") {
            eprintln!("Error writing to log file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test01_logger_escribe_mensajes_con_nivel() {
        let path = std::env::temp_dir().join("logger_test01.log");
        let _ = fs::remove_file(&path);
        let logger = Logger::new(path.to_str().unwrap());

        logger.info("coordinator escuchando", "ACCEPT");
        logger.warn("nodo sin latido", "HEARTBEAT");
        logger.error("fallo de conexion", "CONTROL");
        sleep(Duration::from_millis(200));

        let contenido = fs::read_to_string(&path).unwrap();
        assert!(contenido.contains("[INFO]"));
        assert!(contenido.contains("ACCEPT: coordinator escuchando"));
        assert!(contenido.contains("[WARNING]"));
        assert!(contenido.contains("[ERROR]"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test02_logger_null_descarta_mensajes() {
        let logger = Logger::null();
        logger.info("mensaje perdido", "TEST");
        logger.debug("con data", "TEST", 42);
    }
}
