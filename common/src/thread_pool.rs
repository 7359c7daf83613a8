//! Este modulo contiene el pool de hilos con el que el coordinator y los
//! nodos de almacenamiento atienden sus conexiones entrantes
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::{JoinHandle, panicking, spawn};

/// Tipo que representa un trabajo (job) que puede ejecutarse en un hilo.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Mensajes que reciben los hilos trabajadores.
enum Message {
    /// Nuevo trabajo para ejecutar.
    NewJob(Job),
    /// Mensaje para terminar el hilo.
    Terminate,
}

/// Errores posibles al operar el `ThreadPool`.
#[derive(Debug, PartialEq)]
pub enum ThreadPoolError {
    /// Error al intentar enviar un trabajo a un hilo trabajador.
    SendError,
    /// Error al intentar adquirir el bloqueo de un recurso.
    LockError,
}

impl fmt::Display for ThreadPoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadPoolError::SendError => write!(f, "Failed to send message to worker thread"),
            ThreadPoolError::LockError => write!(f, "Failed to acquire lock"),
        }
    }
}

/// Guardian de un *worker*.
///
/// Vive durante toda la vida del hilo. Cuando el hilo termina, su `Drop`
/// actualiza el contador de hilos vivos y, si el hilo murio por `panic!`
/// (por ejemplo una conexion que exploto a mitad de un pedido), lanza
/// inmediatamente otro *worker* para mantener constante el tamanio del pool.
struct Sentinel {
    shared: Arc<Shared>,
}

impl Drop for Sentinel {
    fn drop(&mut self) {
        self.shared.live.fetch_sub(1, Ordering::SeqCst);

        // Si hay panico, lanzamos un nuevo hilo de reemplazo.
        if panicking() {
            self.shared.spawn_worker();
        }
    }
}

/// Datos compartidos por todos los *workers* del pool.
struct Shared {
    /// Cola de trabajo protegida por `Mutex`.
    receiver: Mutex<Receiver<Message>>,
    /// Numero de hilos vivos en este momento.
    live: AtomicUsize,
    /// Numero maximo de hilos que el pool debe mantener.
    max: usize,
}

impl Shared {
    /// Crea y lanza un nuevo *worker* que consume trabajos de la cola hasta
    /// recibir `Terminate` o hasta que el canal se cierre.
    ///
    /// # Retorna
    /// El `JoinHandle` del hilo recien creado.
    fn spawn_worker(self: &Arc<Self>) -> JoinHandle<()> {
        self.live.fetch_add(1, Ordering::SeqCst);
        let shared = Arc::clone(self);

        spawn(move || {
            let _sentinel_guard = Sentinel {
                shared: Arc::clone(&shared),
            };

            loop {
                let msg = {
                    let rx = match shared.receiver.lock() {
                        Ok(guard) => guard,
                        Err(_) => break,
                    };
                    rx.recv()
                };

                match msg {
                    Ok(Message::NewJob(job)) => {
                        // Si el trabajo paniquea, el Sentinel repone el hilo
                        job();
                    }
                    Ok(Message::Terminate) | Err(_) => break,
                }
            }
        })
    }
}

/// Pool de hilos de tamanio fijo.
///
/// Los servidores del sistema crean un `ThreadPool` y le encargan un trabajo
/// por cada conexion TCP aceptada mediante [`execute`](Self::execute). Si una
/// conexion hace `panic!` al hilo que la atendia, el hilo se repone solo.
///
/// Al hacer `drop` del pool se envia una senial de terminacion a cada hilo y
/// se espera su finalizacion, de modo que ningun hilo queda huerfano.
pub struct ThreadPool {
    handles: Vec<Option<JoinHandle<()>>>,
    sender: Sender<Message>,
    shared: Arc<Shared>,
}

impl ThreadPool {
    /// Crea un nuevo `ThreadPool` con el numero de hilos especificado.
    ///
    /// # Parametros
    /// * `size`: numero de hilos que tendra el pool (minimo 1)
    ///
    /// # Retorna
    /// - Una instancia de `ThreadPool`
    pub fn new(mut size: usize) -> ThreadPool {
        if size == 0 {
            size += 1
        }

        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            receiver: Mutex::new(rx),
            live: AtomicUsize::new(0),
            max: size,
        });

        let mut handles = Vec::with_capacity(size);
        for _ in 0..size {
            handles.push(Some(shared.spawn_worker()));
        }

        ThreadPool {
            handles,
            sender: tx,
            shared,
        }
    }

    /// Encola un trabajo para que lo ejecute alguno de los hilos del pool.
    ///
    /// # Parametros
    /// * `f`: el trabajo a ejecutar, una funcion `FnOnce + Send`
    ///
    /// # Retorna
    /// - `Ok(())` si el trabajo se encolo correctamente
    /// - `Err(ThreadPoolError::SendError)` si el canal del pool esta caido
    pub fn execute<F>(&self, f: F) -> Result<(), ThreadPoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(Message::NewJob(Box::new(f)))
            .map_err(|_| ThreadPoolError::SendError)
    }

    /// Cantidad de workers con los que fue creado el pool.
    pub fn cant_workers(&self) -> usize {
        self.shared.max
    }

    /// Cantidad actual de workers vivos; puede diferir momentaneamente de
    /// `cant_workers` mientras un hilo paniqueado se repone.
    pub fn cant_lives_workers(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        for _ in 0..self.shared.max {
            let _ = self.sender.send(Message::Terminate);
        }

        for handle_opt in &mut self.handles {
            if let Some(handle) = handle_opt.take() {
                let _ = handle.join();
            }
        }
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.shared.max)
            .field("lives workers", &self.shared.live.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::sync::mpsc::channel;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test01_ejecuta_trabajos_en_paralelo() {
        let pool = ThreadPool::new(4);
        let contador = Arc::new(Mutex::new(0));

        for _ in 0..8 {
            let contador = Arc::clone(&contador);
            pool.execute(move || {
                let mut c = contador.lock().unwrap();
                *c += 1;
            })
            .unwrap();
        }

        sleep(Duration::from_millis(300));
        assert_eq!(*contador.lock().unwrap(), 8);
    }

    #[test]
    fn test02_repone_worker_tras_panic() {
        let pool = ThreadPool::new(2);
        pool.execute(|| panic!("conexion rota")).unwrap();
        sleep(Duration::from_millis(300));

        let (tx, rx) = channel();
        pool.execute(move || {
            tx.send(1).unwrap();
        })
        .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 1);
        assert_eq!(pool.cant_workers(), 2);
    }

    #[test]
    fn test03_pool_de_cero_hilos_se_corrige_a_uno() {
        let pool = ThreadPool::new(0);
        assert_eq!(pool.cant_workers(), 1);
    }
}
