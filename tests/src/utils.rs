//! Helpers para levantar un cluster completo en el proceso de test:
//! coordinator y nodos sobre puertos efimeros y directorios temporales
use docfs_client::driver::coordinator_driver::CoordinatorDriver;
use docfs_coordinator::coordinator::Coordinator;
use docfs_coordinator::coordinator_builder::CoordinatorBuilder;
use docfs_node::node_builder::NodeBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Cluster de prueba: un coordinator y sus nodos, todos en este proceso.
pub struct ClusterDePrueba {
    pub coordinator: Arc<Coordinator>,
    pub puerto: u16,
    dir: TempDir,
}

impl ClusterDePrueba {
    /// Directorio de respaldos compartido entre coordinator y nodos, como
    /// en el despliegue original sobre un unico filesystem.
    pub fn dir_backups(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    /// Directorio de cache del coordinator.
    pub fn dir_cache(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    /// Directorio base de almacenamiento de los nodos.
    pub fn dir_storage(&self) -> PathBuf {
        self.dir.path().join("storage")
    }

    /// Ruta del archivo de persistencia del coordinator.
    pub fn ruta_registry(&self) -> PathBuf {
        self.dir.path().join("registry.dat")
    }

    /// Abre la sesion de un cliente contra el coordinator.
    pub fn cliente(&self, usuario: &str) -> CoordinatorDriver {
        CoordinatorDriver::connect("127.0.0.1", self.puerto, usuario)
            .expect("no se pudo registrar el cliente")
    }

    /// Levanta un nodo mas y espera a que quede registrado.
    pub fn lanzar_nodo(&self, id: &str) {
        lanzar_nodo_en(&self.coordinator, self.puerto, &self.dir, id);
    }
}

/// Levanta un coordinator con respaldos compartidos y `cantidad_nodos`
/// nodos ya registrados (ids `n1`, `n2`, ...).
pub fn lanzar_cluster(cantidad_nodos: usize) -> ClusterDePrueba {
    let dir = TempDir::new().expect("no se pudo crear el directorio temporal");
    let coordinator = Arc::new(
        CoordinatorBuilder::new()
            .address("127.0.0.1:0")
            .registry_file(dir.path().join("registry.dat"))
            .directorios(dir.path().join("cache"), dir.path().join("backups"))
            // intervalo largo: las caidas de nodos se marcan a mano
            .heartbeat(3600, 0)
            .build()
            .expect("no se pudo construir el coordinator"),
    );
    let puerto = Arc::clone(&coordinator)
        .iniciar()
        .expect("no se pudo iniciar el coordinator");

    let cluster = ClusterDePrueba {
        coordinator,
        puerto,
        dir,
    };
    for i in 1..=cantidad_nodos {
        cluster.lanzar_nodo(&format!("n{i}"));
    }
    cluster
}

fn lanzar_nodo_en(coordinator: &Arc<Coordinator>, puerto: u16, dir: &TempDir, id: &str) {
    let nodo = NodeBuilder::new()
        .id(id)
        .coordinator(&format!("127.0.0.1:{puerto}"))
        .ip_anunciada("127.0.0.1")
        .directorios(dir.path().join("storage"), dir.path().join("backups"))
        .build()
        .expect("no se pudo construir el nodo");

    let nodo = Arc::new(nodo);
    thread::spawn(move || {
        let _ = nodo.start_node();
    });

    esperar(
        || {
            coordinator
                .nodos()
                .obtener(id)
                .map(|n| n.disponible())
                .unwrap_or(false)
        },
        &format!("el nodo '{id}' no se registro a tiempo"),
    );
}

/// Espera una condicion con timeout, para los arranques asincronicos.
pub fn esperar(condicion: impl Fn() -> bool, mensaje: &str) {
    let limite = Instant::now() + Duration::from_secs(10);
    while Instant::now() < limite {
        if condicion() {
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    panic!("{mensaje}");
}
