//! Este modulo contiene las carpetas logicas de la metadata; los archivos
//! las referencian por ruta y solo el coordinator las conoce
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Ficha de una carpeta logica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FichaCarpeta {
    pub ruta: String,
    pub duenio: String,
    pub creada_en: i64,
}

/// Arbol de carpetas del cluster, como mapa de rutas con `/` separador.
///
/// La ruta vacia es la raiz y existe siempre en forma implicita. Crear
/// `a/b/c` da de alta los ancestros faltantes con el mismo duenio.
#[derive(Debug, Clone, Default)]
pub struct FolderManager {
    carpetas: Arc<Mutex<HashMap<String, FichaCarpeta>>>,
}

impl FolderManager {
    pub fn new() -> FolderManager {
        FolderManager::default()
    }

    /// Indica si la ruta existe (la raiz siempre).
    pub fn existe(&self, ruta: &str) -> bool {
        if ruta.is_empty() {
            return true;
        }
        let carpetas = match self.carpetas.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        carpetas.contains_key(ruta)
    }

    /// Crea una carpeta y sus ancestros faltantes.
    ///
    /// # Parametros
    /// * `ruta`: ruta completa, por ejemplo `docs/2024/enero`
    /// * `duenio`: usuario creador, heredado por los ancestros creados
    ///
    /// # Retorna
    /// - `Ok(cantidad de carpetas creadas)`
    /// - `Err(())` si la ruta ya existia
    pub fn crear(&self, ruta: &str, duenio: &str) -> Result<usize, ()> {
        let mut carpetas = match self.carpetas.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if carpetas.contains_key(ruta) {
            return Err(());
        }

        let ahora = chrono::Local::now().timestamp();
        let mut creadas = 0;
        let mut acumulada = String::new();
        for segmento in ruta.split('/') {
            if !acumulada.is_empty() {
                acumulada.push('/');
            }
            acumulada.push_str(segmento);
            if !carpetas.contains_key(&acumulada) {
                carpetas.insert(
                    acumulada.clone(),
                    FichaCarpeta {
                        ruta: acumulada.clone(),
                        duenio: duenio.to_string(),
                        creada_en: ahora,
                    },
                );
                creadas += 1;
            }
        }
        Ok(creadas)
    }

    /// Restaura una carpeta cargada desde la persistencia.
    pub fn restaurar(&self, ficha: FichaCarpeta) {
        let mut carpetas = match self.carpetas.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        carpetas.insert(ficha.ruta.clone(), ficha);
    }

    /// Copia de todas las carpetas, ordenadas por ruta.
    pub fn listar(&self) -> Vec<FichaCarpeta> {
        let carpetas = match self.carpetas.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut listado: Vec<FichaCarpeta> = carpetas.values().cloned().collect();
        listado.sort_by(|a, b| a.ruta.cmp(&b.ruta));
        listado
    }
}

/// Valida una ruta de carpeta: segmentos no vacios separados por `/`, sin
/// `:` (reservado por el formato de persistencia).
pub fn ruta_valida(ruta: &str) -> bool {
    !ruta.is_empty()
        && !ruta.contains(':')
        && ruta.split('/').all(|segmento| !segmento.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_crear_con_ancestros() {
        let manager = FolderManager::new();
        assert_eq!(manager.crear("docs/2024/enero", "alice"), Ok(3));
        assert!(manager.existe("docs"));
        assert!(manager.existe("docs/2024"));
        assert!(manager.existe("docs/2024/enero"));
        assert_eq!(manager.listar()[0].duenio, "alice");
    }

    #[test]
    fn test02_crear_existente_falla() {
        let manager = FolderManager::new();
        manager.crear("docs", "alice").unwrap();
        assert!(manager.crear("docs", "bob").is_err());
        // un hijo nuevo solo crea lo que falta
        assert_eq!(manager.crear("docs/2024", "bob"), Ok(1));
    }

    #[test]
    fn test03_la_raiz_existe_implicitamente() {
        let manager = FolderManager::new();
        assert!(manager.existe(""));
        assert!(!manager.existe("docs"));
    }

    #[test]
    fn test04_rutas_validas() {
        assert!(ruta_valida("docs"));
        assert!(ruta_valida("docs/2024"));
        assert!(!ruta_valida(""));
        assert!(!ruta_valida("/docs"));
        assert!(!ruta_valida("docs/"));
        assert!(!ruta_valida("docs//2024"));
        assert!(!ruta_valida("do:cs"));
    }
}
