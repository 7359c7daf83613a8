//! Este modulo contiene la cache LRU de busquedas y el barrido del
//! registro que resuelve un SEARCH
use crate::constantes::CAPACIDAD_CACHE_BUSQUEDA;
use crate::registro::archivo::FichaArchivo;
use std::sync::{Arc, Mutex};

/// Entrada de la cache de busquedas.
#[derive(Debug, Clone)]
struct EntradaBusqueda {
    clave: String,
    resultados: String,
    timestamp: i64,
}

/// Cache LRU de resultados de busqueda, acotada a
/// [`CAPACIDAD_CACHE_BUSQUEDA`] entradas.
///
/// La clave incluye al usuario ademas del patron, porque los resultados
/// estan filtrados por permiso de lectura. Cualquier alta o baja de
/// archivos invalida la cache completa.
#[derive(Debug, Clone, Default)]
pub struct SearchCache {
    entradas: Arc<Mutex<Vec<EntradaBusqueda>>>,
}

impl SearchCache {
    pub fn new() -> SearchCache {
        SearchCache::default()
    }

    fn clave(usuario: &str, patron: &str) -> String {
        format!("{usuario}\n{patron}")
    }

    /// Busca un resultado cacheado y lo vuelve el mas reciente.
    pub fn buscar(&self, usuario: &str, patron: &str) -> Option<String> {
        let clave = Self::clave(usuario, patron);
        let mut entradas = match self.entradas.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let posicion = entradas.iter().position(|e| e.clave == clave)?;
        let mut entrada = entradas.remove(posicion);
        entrada.timestamp = chrono::Local::now().timestamp();
        let resultados = entrada.resultados.clone();
        entradas.insert(0, entrada);
        Some(resultados)
    }

    /// Inserta un resultado, desalojando el menos reciente si no hay lugar.
    pub fn insertar(&self, usuario: &str, patron: &str, resultados: &str) {
        let clave = Self::clave(usuario, patron);
        let mut entradas = match self.entradas.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entradas.retain(|e| e.clave != clave);
        entradas.insert(
            0,
            EntradaBusqueda {
                clave,
                resultados: resultados.to_string(),
                timestamp: chrono::Local::now().timestamp(),
            },
        );
        // desalojo por timestamp; los empates caen en la posicion menos
        // reciente
        while entradas.len() > CAPACIDAD_CACHE_BUSQUEDA {
            let Some(posicion) = entradas
                .iter()
                .enumerate()
                .rev()
                .min_by_key(|(_, e)| e.timestamp)
                .map(|(posicion, _)| posicion)
            else {
                break;
            };
            entradas.remove(posicion);
        }
    }

    /// Vacia la cache completa (alta o baja de archivos).
    pub fn invalidar(&self) {
        let mut entradas = match self.entradas.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entradas.clear();
    }

    /// Cantidad de entradas cacheadas.
    pub fn cantidad(&self) -> usize {
        let entradas = match self.entradas.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entradas.len()
    }
}

/// Barre las fichas resolviendo un patron de busqueda para un usuario.
///
/// Coincidencias, de mas a menos fuerte: nombre exacto, subcadena, y
/// subcadena ignorando mayusculas. Solo entran archivos que el usuario
/// puede leer.
///
/// # Retorna
/// - Nombres coincidentes en orden de fuerza de la coincidencia
pub fn resolver_busqueda(fichas: &[FichaArchivo], usuario: &str, patron: &str) -> Vec<String> {
    let patron_minusculas = patron.to_lowercase();
    let mut exactos = Vec::new();
    let mut subcadenas = Vec::new();
    let mut insensibles = Vec::new();

    for ficha in fichas {
        if !ficha.puede_leer(usuario) {
            continue;
        }
        if ficha.nombre == patron {
            exactos.push(ficha.nombre.clone());
        } else if ficha.nombre.contains(patron) {
            subcadenas.push(ficha.nombre.clone());
        } else if ficha.nombre.to_lowercase().contains(&patron_minusculas) {
            insensibles.push(ficha.nombre.clone());
        }
    }

    exactos.extend(subcadenas);
    exactos.extend(insensibles);
    exactos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registro::archivo::EntradaAcl;

    fn ficha(nombre: &str, duenio: &str) -> FichaArchivo {
        FichaArchivo::nueva(nombre, duenio, "n1")
    }

    #[test]
    fn test01_cache_lru_acotada() {
        let cache = SearchCache::new();
        for i in 0..(CAPACIDAD_CACHE_BUSQUEDA + 10) {
            cache.insertar("alice", &format!("patron{i}"), "resultados");
        }
        assert_eq!(cache.cantidad(), CAPACIDAD_CACHE_BUSQUEDA);
        // la mas vieja fue desalojada, la mas nueva sigue
        assert!(cache.buscar("alice", "patron0").is_none());
        assert!(cache
            .buscar("alice", &format!("patron{}", CAPACIDAD_CACHE_BUSQUEDA + 9))
            .is_some());
    }

    #[test]
    fn test02_buscar_refresca_la_entrada() {
        let cache = SearchCache::new();
        cache.insertar("alice", "a", "ra");
        for i in 0..(CAPACIDAD_CACHE_BUSQUEDA - 1) {
            cache.insertar("alice", &format!("relleno{i}"), "r");
        }
        // tocar "a" la vuelve la mas reciente y sobrevive al desalojo
        assert_eq!(cache.buscar("alice", "a"), Some("ra".to_string()));
        cache.insertar("alice", "nueva", "rn");
        assert!(cache.buscar("alice", "a").is_some());
    }

    #[test]
    fn test03_invalidar_vacia_todo() {
        let cache = SearchCache::new();
        cache.insertar("alice", "a", "ra");
        cache.insertar("bob", "b", "rb");
        cache.invalidar();
        assert_eq!(cache.cantidad(), 0);
    }

    #[test]
    fn test04_la_clave_distingue_usuarios() {
        let cache = SearchCache::new();
        cache.insertar("alice", "informe", "solo de alice");
        assert!(cache.buscar("bob", "informe").is_none());
    }

    #[test]
    fn test05_busqueda_filtra_por_lectura_y_ordena_por_fuerza() {
        let mut ajeno = ficha("informe_secreto", "carol");
        let mut compartido = ficha("INFORME_ANUAL", "carol");
        compartido.otorgar("alice", EntradaAcl::desde_mascara(1));
        ajeno.otorgar("bob", EntradaAcl::desde_mascara(1));

        let fichas = vec![
            ficha("informe", "alice"),
            ficha("informe_borrador", "alice"),
            compartido,
            ajeno,
        ];

        let resultados = resolver_busqueda(&fichas, "alice", "informe");
        assert_eq!(
            resultados,
            vec![
                "informe".to_string(),
                "informe_borrador".to_string(),
                "INFORME_ANUAL".to_string(),
            ]
        );
    }
}
