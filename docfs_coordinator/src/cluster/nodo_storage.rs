//! Este modulo contiene las fichas de los nodos de almacenamiento y el
//! manager que las indexa por id preservando el orden de registro
use docfs_client::protocol::payloads::RegistroNodo;
use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::{Arc, Mutex, RwLock};

/// Ficha de un nodo de almacenamiento conocido.
///
/// El canal de control es el socket aceptado en el registro; su mutex
/// serializa los pares pedido/respuesta que el coordinator le manda (un
/// pedido en vuelo por nodo a la vez). Un nodo caido pierde el canal pero
/// conserva la ficha: las fichas viven lo que viva el proceso.
#[derive(Debug, Clone)]
pub struct NodoStorage {
    pub id: String,
    pub ip: String,
    pub puerto_cliente: u16,
    pub puerto_control: u16,
    pub control: Option<Arc<Mutex<TcpStream>>>,
    pub activo: bool,
    pub fallado: bool,
    pub ultimo_latido: i64,
}

impl NodoStorage {
    /// Indica si el nodo puede atender pedidos ahora mismo.
    pub fn disponible(&self) -> bool {
        self.activo && !self.fallado && self.control.is_some()
    }
}

/// Manager de nodos: mapa por id mas la lista de orden de registro, que
/// define el nodo por defecto de un CREATE.
#[derive(Debug, Clone, Default)]
pub struct ManagerNodos {
    nodos: Arc<RwLock<HashMap<String, NodoStorage>>>,
    orden: Arc<Mutex<Vec<String>>>,
}

impl ManagerNodos {
    pub fn new() -> ManagerNodos {
        ManagerNodos::default()
    }

    /// Instala o refresca la ficha de un nodo que se registra.
    ///
    /// Un id conocido reusa su lugar en el orden de registro y recupera el
    /// estado activo con el canal nuevo.
    ///
    /// # Parametros
    /// * `registro`: anuncio recibido del nodo
    /// * `canal`: socket aceptado que queda como canal de control
    ///
    /// # Retorna
    /// - `true` si el id ya era conocido (reingreso)
    pub fn registrar(&self, registro: &RegistroNodo, canal: TcpStream) -> bool {
        // mismo orden de toma que los recorridos: primero orden, luego
        // nodos
        let mut orden = match self.orden.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut nodos = match self.nodos.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let reingreso = nodos.contains_key(&registro.id);

        nodos.insert(
            registro.id.clone(),
            NodoStorage {
                id: registro.id.clone(),
                ip: registro.ip.clone(),
                puerto_cliente: registro.puerto_cliente,
                puerto_control: registro.puerto_control,
                control: Some(Arc::new(Mutex::new(canal))),
                activo: true,
                fallado: false,
                ultimo_latido: chrono::Local::now().timestamp(),
            },
        );

        if !reingreso {
            orden.push(registro.id.clone());
        }
        reingreso
    }

    /// Copia de la ficha de un nodo.
    pub fn obtener(&self, id: &str) -> Option<NodoStorage> {
        let nodos = match self.nodos.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        nodos.get(id).cloned()
    }

    /// Primer nodo disponible en orden de registro (destino por defecto de
    /// un CREATE sin nodo explicito).
    pub fn primero_disponible(&self) -> Option<NodoStorage> {
        let orden = match self.orden.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let nodos = match self.nodos.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        orden
            .iter()
            .filter_map(|id| nodos.get(id))
            .find(|nodo| nodo.disponible())
            .cloned()
    }

    /// Primer nodo disponible distinto del dado (destino de un failover).
    pub fn otro_disponible(&self, excluido: &str) -> Option<NodoStorage> {
        let orden = match self.orden.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let nodos = match self.nodos.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        orden
            .iter()
            .filter(|id| id.as_str() != excluido)
            .filter_map(|id| nodos.get(id))
            .find(|nodo| nodo.disponible())
            .cloned()
    }

    /// Marca un nodo como caido y suelta su canal de control.
    pub fn marcar_fallado(&self, id: &str) {
        let mut nodos = match self.nodos.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(nodo) = nodos.get_mut(id) {
            nodo.activo = false;
            nodo.fallado = true;
            nodo.control = None;
        }
    }

    /// Refresca el latido de un nodo vivo, recuperandolo si estaba caido
    /// pero su canal sigue abierto.
    pub fn marcar_vivo(&self, id: &str) {
        let mut nodos = match self.nodos.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(nodo) = nodos.get_mut(id) {
            nodo.activo = true;
            nodo.fallado = false;
            nodo.ultimo_latido = chrono::Local::now().timestamp();
        }
    }

    /// Copia de todas las fichas en orden de registro.
    pub fn listar(&self) -> Vec<NodoStorage> {
        let orden = match self.orden.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let nodos = match self.nodos.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        orden.iter().filter_map(|id| nodos.get(id).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn canal_de_prueba() -> (TcpListener, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stream = TcpStream::connect(addr).unwrap();
        (listener, stream)
    }

    fn registro(id: &str) -> RegistroNodo {
        RegistroNodo {
            id: id.to_string(),
            ip: "127.0.0.1".to_string(),
            puerto_cliente: 9100,
            puerto_control: 10100,
            archivos: vec![],
        }
    }

    #[test]
    fn test01_registro_y_orden() {
        let manager = ManagerNodos::new();
        let (_l1, c1) = canal_de_prueba();
        let (_l2, c2) = canal_de_prueba();

        assert!(!manager.registrar(&registro("n1"), c1));
        assert!(!manager.registrar(&registro("n2"), c2));
        assert_eq!(manager.primero_disponible().unwrap().id, "n1");
        assert_eq!(manager.otro_disponible("n1").unwrap().id, "n2");
        assert_eq!(manager.listar().len(), 2);
    }

    #[test]
    fn test02_reingreso_reusa_la_ficha() {
        let manager = ManagerNodos::new();
        let (_l1, c1) = canal_de_prueba();
        manager.registrar(&registro("n1"), c1);
        manager.marcar_fallado("n1");
        assert!(!manager.obtener("n1").unwrap().disponible());

        let (_l2, c2) = canal_de_prueba();
        assert!(manager.registrar(&registro("n1"), c2));
        assert!(manager.obtener("n1").unwrap().disponible());
        assert_eq!(manager.listar().len(), 1);
    }

    #[test]
    fn test03_fallado_pierde_el_canal_pero_no_la_ficha() {
        let manager = ManagerNodos::new();
        let (_l1, c1) = canal_de_prueba();
        manager.registrar(&registro("n1"), c1);
        manager.marcar_fallado("n1");

        let ficha = manager.obtener("n1").unwrap();
        assert!(ficha.fallado);
        assert!(ficha.control.is_none());
        assert!(manager.primero_disponible().is_none());
    }
}
