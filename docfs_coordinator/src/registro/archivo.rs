//! Este modulo contiene la ficha de metadata de un archivo del cluster:
//! duenio, nodo asignado, carpeta, estadisticas, ACL y checkpoints
use docfs_client::protocol::constantes::{ACCESO_ESCRITURA, ACCESO_LECTURA};
use std::collections::HashMap;

/// Entrada de la lista de control de acceso de un archivo.
///
/// El permiso de escritura implica siempre el de lectura; el duenio nunca
/// aparece en la ACL porque tiene todos los permisos de por si.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntradaAcl {
    pub puede_leer: bool,
    pub puede_escribir: bool,
}

impl EntradaAcl {
    /// Construye la entrada a partir de la mascara de acceso de una trama,
    /// normalizando la implicacion escritura => lectura.
    pub fn desde_mascara(mascara: i32) -> EntradaAcl {
        let puede_escribir = mascara & ACCESO_ESCRITURA != 0;
        EntradaAcl {
            puede_leer: puede_escribir || mascara & ACCESO_LECTURA != 0,
            puede_escribir,
        }
    }
}

/// Checkpoint registrado de un archivo; el contenido vive en el nodo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistroCheckpoint {
    pub tag: String,
    pub creador: String,
    pub creado_en: i64,
    pub tamanio: i64,
}

/// Ficha de metadata de un archivo del cluster.
///
/// # Campos
/// - `nombre`: nombre globalmente unico.
/// - `duenio`: usuario creador, con todos los permisos.
/// - `nodo`: id del nodo que tiene los bytes (puede estar caido).
/// - `carpeta`: carpeta logica; vacia es la raiz.
/// - `creado_en` / `modificado_en` / `accedido_en`: epoch en segundos.
/// - `tamanio` / `palabras` / `caracteres`: estadisticas cacheadas, se
///   refrescan preguntando al nodo duenio.
/// - `acl`: permisos por usuario (sin el duenio).
/// - `checkpoints`: indice de checkpoints por tag.
#[derive(Debug, Clone, PartialEq)]
pub struct FichaArchivo {
    pub nombre: String,
    pub duenio: String,
    pub nodo: String,
    pub carpeta: String,
    pub creado_en: i64,
    pub modificado_en: i64,
    pub accedido_en: i64,
    pub tamanio: i64,
    pub palabras: i32,
    pub caracteres: i32,
    pub acl: HashMap<String, EntradaAcl>,
    pub checkpoints: HashMap<String, RegistroCheckpoint>,
}

impl FichaArchivo {
    /// Crea la ficha de un archivo recien creado, sin ACL ni checkpoints.
    ///
    /// # Parametros
    /// * `nombre`: nombre global del archivo
    /// * `duenio`: usuario creador
    /// * `nodo`: id del nodo asignado
    pub fn nueva(nombre: &str, duenio: &str, nodo: &str) -> FichaArchivo {
        let ahora = chrono::Local::now().timestamp();
        FichaArchivo {
            nombre: nombre.to_string(),
            duenio: duenio.to_string(),
            nodo: nodo.to_string(),
            carpeta: String::new(),
            creado_en: ahora,
            modificado_en: ahora,
            accedido_en: ahora,
            tamanio: 0,
            palabras: 0,
            caracteres: 0,
            acl: HashMap::new(),
            checkpoints: HashMap::new(),
        }
    }

    /// Indica si el usuario puede leer el archivo.
    pub fn puede_leer(&self, usuario: &str) -> bool {
        usuario == self.duenio
            || self.acl.get(usuario).map(|e| e.puede_leer).unwrap_or(false)
    }

    /// Indica si el usuario puede escribir el archivo.
    pub fn puede_escribir(&self, usuario: &str) -> bool {
        usuario == self.duenio
            || self
                .acl
                .get(usuario)
                .map(|e| e.puede_escribir)
                .unwrap_or(false)
    }

    /// Marcador de acceso del listado VIEW: `O` duenio, `W` escritura,
    /// `R` solo lectura, `-` sin acceso.
    pub fn marcador_acceso(&self, usuario: &str) -> char {
        if usuario == self.duenio {
            'O'
        } else if self.puede_escribir(usuario) {
            'W'
        } else if self.puede_leer(usuario) {
            'R'
        } else {
            '-'
        }
    }

    /// Otorga o promueve el acceso de un usuario.
    ///
    /// Una entrada existente se actualiza; otorgar escritura sobre una
    /// entrada de solo lectura la promueve. El duenio nunca entra a la ACL.
    ///
    /// # Retorna
    /// - `false` si el usuario es el duenio (no hay nada que otorgar)
    pub fn otorgar(&mut self, usuario: &str, entrada: EntradaAcl) -> bool {
        if usuario == self.duenio {
            return false;
        }
        self.acl.insert(usuario.to_string(), entrada);
        true
    }

    /// Revoca el acceso de un usuario.
    ///
    /// # Retorna
    /// - `true` si habia una entrada que revocar
    pub fn revocar(&mut self, usuario: &str) -> bool {
        self.acl.remove(usuario).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test01_duenio_tiene_todos_los_permisos() {
        let ficha = FichaArchivo::nueva("informe", "alice", "n1");
        assert!(ficha.puede_leer("alice"));
        assert!(ficha.puede_escribir("alice"));
        assert_eq!(ficha.marcador_acceso("alice"), 'O');
        assert!(!ficha.puede_leer("bob"));
        assert_eq!(ficha.marcador_acceso("bob"), '-');
    }

    #[test]
    fn test02_mascara_normaliza_escritura_implica_lectura() {
        let solo_escritura = EntradaAcl::desde_mascara(ACCESO_ESCRITURA);
        assert!(solo_escritura.puede_leer);
        assert!(solo_escritura.puede_escribir);

        let solo_lectura = EntradaAcl::desde_mascara(ACCESO_LECTURA);
        assert!(solo_lectura.puede_leer);
        assert!(!solo_lectura.puede_escribir);
    }

    #[test]
    fn test03_otorgar_actualiza_y_promueve() {
        let mut ficha = FichaArchivo::nueva("informe", "alice", "n1");
        assert!(ficha.otorgar("bob", EntradaAcl::desde_mascara(ACCESO_LECTURA)));
        assert_eq!(ficha.marcador_acceso("bob"), 'R');

        assert!(ficha.otorgar("bob", EntradaAcl::desde_mascara(ACCESO_ESCRITURA)));
        assert_eq!(ficha.marcador_acceso("bob"), 'W');
        assert_eq!(ficha.acl.len(), 1);
    }

    #[test]
    fn test04_el_duenio_no_entra_en_la_acl() {
        let mut ficha = FichaArchivo::nueva("informe", "alice", "n1");
        assert!(!ficha.otorgar("alice", EntradaAcl::desde_mascara(ACCESO_LECTURA)));
        assert!(ficha.acl.is_empty());
    }

    #[test]
    fn test05_revocar() {
        let mut ficha = FichaArchivo::nueva("informe", "alice", "n1");
        ficha.otorgar("bob", EntradaAcl::desde_mascara(ACCESO_LECTURA));
        assert!(ficha.revocar("bob"));
        assert!(!ficha.revocar("bob"));
        assert!(!ficha.puede_leer("bob"));
    }
}
