//! Este modulo contiene el registro de usuarios y el conjunto de sesiones
//! activas que sostiene la regla de una sesion por usuario
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Datos de una sesion activa, usados para describir el rechazo cuando el
/// mismo usuario intenta entrar dos veces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoSesion {
    pub direccion: String,
    pub login_en: i64,
}

/// Registro de usuarios (solo crece) y sesiones activas del cluster.
///
/// Un usuario queda registrado en su primer login exitoso y persiste; la
/// sesion activa se sostiene mientras viva su conexion TCP y a lo sumo hay
/// una por usuario en todo el cluster.
#[derive(Debug, Clone, Default)]
pub struct UserManager {
    usuarios: Arc<Mutex<HashMap<String, i64>>>,
    sesiones: Arc<Mutex<HashMap<String, InfoSesion>>>,
}

impl UserManager {
    pub fn new() -> UserManager {
        UserManager::default()
    }

    /// Registra al usuario si es su primera vez.
    pub fn registrar_si_falta(&self, usuario: &str) {
        let mut usuarios = match self.usuarios.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        usuarios
            .entry(usuario.to_string())
            .or_insert_with(|| chrono::Local::now().timestamp());
    }

    /// Indica si el usuario esta en el registro.
    pub fn existe(&self, usuario: &str) -> bool {
        let usuarios = match self.usuarios.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        usuarios.contains_key(usuario)
    }

    /// Abre la sesion del usuario si no tiene otra activa.
    ///
    /// # Parametros
    /// * `usuario`: usuario que se registra
    /// * `direccion`: direccion remota de la conexion
    ///
    /// # Retorna
    /// - `Err(InfoSesion)` con la sesion preexistente si ya hay una
    pub fn abrir_sesion(&self, usuario: &str, direccion: &str) -> Result<(), InfoSesion> {
        let mut sesiones = match self.sesiones.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(existente) = sesiones.get(usuario) {
            return Err(existente.clone());
        }
        sesiones.insert(
            usuario.to_string(),
            InfoSesion {
                direccion: direccion.to_string(),
                login_en: chrono::Local::now().timestamp(),
            },
        );
        Ok(())
    }

    /// Cierra la sesion del usuario (EOF de su conexion).
    pub fn cerrar_sesion(&self, usuario: &str) {
        let mut sesiones = match self.sesiones.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sesiones.remove(usuario);
    }

    /// Usuarios registrados en orden alfabetico, con su fecha de alta.
    pub fn listar(&self) -> Vec<(String, i64)> {
        let usuarios = match self.usuarios.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut listado: Vec<(String, i64)> =
            usuarios.iter().map(|(u, t)| (u.clone(), *t)).collect();
        listado.sort();
        listado
    }

    /// Cantidad de sesiones activas en este momento.
    pub fn sesiones_activas(&self) -> usize {
        let sesiones = match self.sesiones.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sesiones.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_una_sesion_por_usuario() {
        let manager = UserManager::new();
        manager.abrir_sesion("alice", "127.0.0.1:5000").unwrap();

        let rechazo = manager.abrir_sesion("alice", "127.0.0.1:6000").unwrap_err();
        assert_eq!(rechazo.direccion, "127.0.0.1:5000");

        manager.cerrar_sesion("alice");
        assert!(manager.abrir_sesion("alice", "127.0.0.1:6000").is_ok());
    }

    #[test]
    fn test02_registro_solo_crece() {
        let manager = UserManager::new();
        manager.registrar_si_falta("alice");
        manager.registrar_si_falta("alice");
        manager.registrar_si_falta("bob");
        assert!(manager.existe("alice"));
        assert!(!manager.existe("carol"));
        assert_eq!(manager.listar().len(), 2);
    }

    #[test]
    fn test03_sesiones_independientes_por_usuario() {
        let manager = UserManager::new();
        manager.abrir_sesion("alice", "a").unwrap();
        manager.abrir_sesion("bob", "b").unwrap();
        assert_eq!(manager.sesiones_activas(), 2);
        manager.cerrar_sesion("bob");
        assert_eq!(manager.sesiones_activas(), 1);
    }
}
