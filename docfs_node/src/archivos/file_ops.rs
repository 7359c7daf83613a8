//! Este modulo implementa el layout en disco del nodo: el arbol de
//! almacenamiento, el arbol de respaldos con su sidecar de undo y el
//! subdirectorio de checkpoints
use crate::constantes::{DIR_CHECKPOINTS, EXTENSION_SIDECAR};
use docfs_client::protocol::payloads::EstadisticasArchivo;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

/// Acceso al disco de un nodo de almacenamiento.
///
/// Cada nodo es duenio de `storage/<id>/` (contenido vivo, con un
/// subdirectorio `checkpoints/`) y de `backups/<id>/` (ultima version
/// confirmada de cada archivo mas el sidecar `.backup` que alimenta el
/// undo). Un MOVE puede recolocar el contenido vivo dentro de carpetas,
/// pero el arbol de respaldos y los checkpoints quedan siempre planos,
/// indexados por el nombre global del archivo.
#[derive(Debug, Clone)]
pub struct ArchivosNodo {
    dir_storage: PathBuf,
    dir_backup: PathBuf,
}

impl ArchivosNodo {
    /// Prepara los directorios del nodo, creandolos si no existen.
    ///
    /// # Parametros
    /// * `base_storage`: directorio base de almacenamiento
    /// * `base_backup`: directorio base de respaldos
    /// * `id`: id del nodo, usado como subdirectorio en ambos arboles
    pub fn new(base_storage: &Path, base_backup: &Path, id: &str) -> Result<ArchivosNodo, Error> {
        let dir_storage = base_storage.join(id);
        let dir_backup = base_backup.join(id);
        fs::create_dir_all(dir_storage.join(DIR_CHECKPOINTS))?;
        fs::create_dir_all(&dir_backup)?;
        Ok(ArchivosNodo {
            dir_storage,
            dir_backup,
        })
    }

    /// Directorio de almacenamiento vivo del nodo.
    pub fn dir_storage(&self) -> &Path {
        &self.dir_storage
    }

    /// Ubica el contenido vivo de un archivo por su nombre global.
    ///
    /// Primero prueba la ruta plana; si el archivo fue movido a una
    /// carpeta, lo busca por nombre en el resto del arbol (los nombres son
    /// globalmente unicos, asi que a lo sumo hay una coincidencia).
    pub fn resolver(&self, nombre: &str) -> Option<PathBuf> {
        let plana = self.dir_storage.join(nombre);
        if plana.is_file() {
            return Some(plana);
        }
        buscar_por_nombre(&self.dir_storage, nombre, &self.dir_storage.join(DIR_CHECKPOINTS))
    }

    /// Indica si el archivo existe en el arbol vivo.
    pub fn existe(&self, nombre: &str) -> bool {
        self.resolver(nombre).is_some()
    }

    /// Crea un archivo vacio en el arbol vivo y en el de respaldos.
    ///
    /// # Errores
    /// - `AlreadyExists` si el nombre ya tiene contenido vivo
    pub fn crear(&self, nombre: &str) -> Result<(), Error> {
        if self.existe(nombre) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("el archivo '{nombre}' ya existe"),
            ));
        }
        fs::write(self.dir_storage.join(nombre), b"")?;
        fs::write(self.dir_backup.join(nombre), b"")?;
        Ok(())
    }

    /// Lee el contenido vivo completo.
    ///
    /// # Errores
    /// - `NotFound` si el archivo no esta en el arbol vivo
    pub fn leer(&self, nombre: &str) -> Result<String, Error> {
        let ruta = self.resolver(nombre).ok_or_else(|| no_encontrado(nombre))?;
        fs::read_to_string(ruta)
    }

    /// Borra el contenido vivo; el respaldo se conserva para que el
    /// coordinator pueda seguir sirviendo el archivo si hace falta.
    pub fn borrar(&self, nombre: &str) -> Result<(), Error> {
        let ruta = self.resolver(nombre).ok_or_else(|| no_encontrado(nombre))?;
        fs::remove_file(ruta)
    }

    /// Recoloca el contenido vivo dentro de una carpeta del arbol.
    ///
    /// # Parametros
    /// * `nombre`: nombre global del archivo
    /// * `carpeta`: carpeta destino relativa; vacia vuelve a la raiz
    pub fn mover(&self, nombre: &str, carpeta: &str) -> Result<(), Error> {
        let origen = self.resolver(nombre).ok_or_else(|| no_encontrado(nombre))?;
        let destino = if carpeta.is_empty() {
            self.dir_storage.join(nombre)
        } else {
            let dir = self.dir_storage.join(carpeta);
            fs::create_dir_all(&dir)?;
            dir.join(nombre)
        };
        if origen != destino {
            fs::rename(origen, destino)?;
        }
        Ok(())
    }

    /// Reemplaza el contenido vivo en forma atomica: escribe a un archivo
    /// temporario con sufijo aleatorio y renombra sobre el destino.
    pub fn escribir_atomico(&self, nombre: &str, contenido: &str) -> Result<(), Error> {
        let destino = self
            .resolver(nombre)
            .unwrap_or_else(|| self.dir_storage.join(nombre));
        let temporal = destino.with_file_name(format!(
            "{nombre}.tmp.{}",
            sufijo_aleatorio()
        ));
        fs::write(&temporal, contenido)?;
        fs::rename(temporal, destino)
    }

    /// Ruta del sidecar `.backup` que alimenta el undo.
    pub fn ruta_sidecar(&self, nombre: &str) -> PathBuf {
        self.dir_backup.join(format!("{nombre}{EXTENSION_SIDECAR}"))
    }

    /// Ruta de la copia de respaldo plana del archivo.
    pub fn ruta_backup(&self, nombre: &str) -> PathBuf {
        self.dir_backup.join(nombre)
    }

    /// Copia el contenido vivo actual al sidecar, antes de pisarlo.
    pub fn respaldar_en_sidecar(&self, nombre: &str) -> Result<(), Error> {
        let vivo = self.resolver(nombre).ok_or_else(|| no_encontrado(nombre))?;
        fs::copy(vivo, self.ruta_sidecar(nombre))?;
        Ok(())
    }

    /// Refresca la copia de respaldo plana con el contenido confirmado.
    pub fn actualizar_backup(&self, nombre: &str, contenido: &str) -> Result<(), Error> {
        fs::write(self.ruta_backup(nombre), contenido)
    }

    /// Intercambia el contenido vivo con el sidecar (el paso de un undo).
    ///
    /// El vivo pasa a un temporal, el sidecar pasa a vivo y el temporal
    /// queda como nuevo sidecar, dejando ambas versiones intercambiadas.
    ///
    /// # Errores
    /// - `NotFound` si no hay sidecar del archivo
    pub fn intercambiar_con_sidecar(&self, nombre: &str) -> Result<(), Error> {
        let sidecar = self.ruta_sidecar(nombre);
        if !sidecar.is_file() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("no hay respaldo de '{nombre}' para deshacer"),
            ));
        }
        let vivo = self.resolver(nombre).ok_or_else(|| no_encontrado(nombre))?;

        let temporal = self
            .dir_backup
            .join(format!("{nombre}.tmp.{}", sufijo_aleatorio()));
        fs::copy(&vivo, &temporal)?;
        fs::copy(&sidecar, &vivo)?;
        fs::rename(&temporal, &sidecar)?;
        Ok(())
    }

    /// Materializa un checkpoint etiquetado del contenido vivo.
    ///
    /// # Retorna
    /// - Tamanio en bytes del checkpoint creado
    pub fn crear_checkpoint(&self, nombre: &str, tag: &str) -> Result<u64, Error> {
        let vivo = self.resolver(nombre).ok_or_else(|| no_encontrado(nombre))?;
        fs::copy(vivo, self.ruta_checkpoint(nombre, tag))
    }

    /// Lee el contenido de un checkpoint.
    ///
    /// # Errores
    /// - `NotFound` si el checkpoint no esta materializado
    pub fn leer_checkpoint(&self, nombre: &str, tag: &str) -> Result<String, Error> {
        let ruta = self.ruta_checkpoint(nombre, tag);
        if !ruta.is_file() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("no existe el checkpoint '{tag}' de '{nombre}'"),
            ));
        }
        fs::read_to_string(ruta)
    }

    /// Pisa el contenido vivo con el de un checkpoint y refresca la copia
    /// de respaldo.
    pub fn revertir_a_checkpoint(&self, nombre: &str, tag: &str) -> Result<(), Error> {
        let contenido = self.leer_checkpoint(nombre, tag)?;
        self.escribir_atomico(nombre, &contenido)?;
        self.actualizar_backup(nombre, &contenido)
    }

    /// Lista los nombres de los archivos vivos del nodo, para anunciarlos
    /// al registrarse.
    pub fn listar(&self) -> Vec<String> {
        let mut nombres = Vec::new();
        recolectar_nombres(
            &self.dir_storage,
            &self.dir_storage.join(DIR_CHECKPOINTS),
            &mut nombres,
        );
        nombres.sort();
        nombres
    }

    /// Calcula las estadisticas del contenido vivo de un archivo.
    pub fn estadisticas(&self, nombre: &str) -> Result<EstadisticasArchivo, Error> {
        let contenido = self.leer(nombre)?;
        Ok(EstadisticasArchivo::desde_contenido(&contenido))
    }

    fn ruta_checkpoint(&self, nombre: &str, tag: &str) -> PathBuf {
        self.dir_storage
            .join(DIR_CHECKPOINTS)
            .join(format!("{nombre}.{tag}"))
    }
}

/// Sufijo hexadecimal aleatorio para archivos temporarios.
fn sufijo_aleatorio() -> String {
    let mut bytes = [0u8; 4];
    rand::fill(&mut bytes);
    hex::encode(bytes)
}

fn no_encontrado(nombre: &str) -> Error {
    Error::new(
        ErrorKind::NotFound,
        format!("el archivo '{nombre}' no existe en este nodo"),
    )
}

/// Busca recursivamente un archivo por nombre, salteando el subdirectorio
/// de checkpoints.
fn buscar_por_nombre(dir: &Path, nombre: &str, excluido: &Path) -> Option<PathBuf> {
    let entradas = fs::read_dir(dir).ok()?;
    for entrada in entradas.flatten() {
        let ruta = entrada.path();
        if ruta == excluido {
            continue;
        }
        if ruta.is_dir() {
            if let Some(hallada) = buscar_por_nombre(&ruta, nombre, excluido) {
                return Some(hallada);
            }
        } else if entrada.file_name().to_string_lossy() == nombre {
            return Some(ruta);
        }
    }
    None
}

/// Junta los nombres de archivo de todo el arbol vivo.
fn recolectar_nombres(dir: &Path, excluido: &Path, nombres: &mut Vec<String>) {
    let Ok(entradas) = fs::read_dir(dir) else {
        return;
    };
    for entrada in entradas.flatten() {
        let ruta = entrada.path();
        if ruta == excluido {
            continue;
        }
        if ruta.is_dir() {
            recolectar_nombres(&ruta, excluido, nombres);
        } else {
            nombres.push(entrada.file_name().to_string_lossy().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn archivos() -> (TempDir, ArchivosNodo) {
        let dir = TempDir::new().unwrap();
        let archivos = ArchivosNodo::new(
            &dir.path().join("storage"),
            &dir.path().join("backups"),
            "nodo-1",
        )
        .unwrap();
        (dir, archivos)
    }

    #[test]
    fn test01_crear_y_leer_vacio() {
        let (_dir, archivos) = archivos();
        archivos.crear("informe").unwrap();
        assert_eq!(archivos.leer("informe").unwrap(), "");
        assert!(archivos.ruta_backup("informe").is_file());
        // crear dos veces falla
        assert!(archivos.crear("informe").is_err());
    }

    #[test]
    fn test02_escritura_atomica_y_respaldo() {
        let (_dir, archivos) = archivos();
        archivos.crear("informe").unwrap();
        archivos.respaldar_en_sidecar("informe").unwrap();
        archivos.escribir_atomico("informe", "Hola mundo.\n").unwrap();
        archivos.actualizar_backup("informe", "Hola mundo.\n").unwrap();

        assert_eq!(archivos.leer("informe").unwrap(), "Hola mundo.\n");
        assert_eq!(
            fs::read_to_string(archivos.ruta_backup("informe")).unwrap(),
            "Hola mundo.\n"
        );
        assert_eq!(
            fs::read_to_string(archivos.ruta_sidecar("informe")).unwrap(),
            ""
        );
    }

    #[test]
    fn test03_intercambio_con_sidecar() {
        let (_dir, archivos) = archivos();
        archivos.crear("informe").unwrap();
        archivos.escribir_atomico("informe", "version vieja\n").unwrap();
        archivos.respaldar_en_sidecar("informe").unwrap();
        archivos.escribir_atomico("informe", "version nueva\n").unwrap();

        archivos.intercambiar_con_sidecar("informe").unwrap();
        assert_eq!(archivos.leer("informe").unwrap(), "version vieja\n");
        // un segundo intercambio vuelve a la version nueva
        archivos.intercambiar_con_sidecar("informe").unwrap();
        assert_eq!(archivos.leer("informe").unwrap(), "version nueva\n");
    }

    #[test]
    fn test04_mover_y_resolver() {
        let (_dir, archivos) = archivos();
        archivos.crear("informe").unwrap();
        archivos.mover("informe", "docs/2024").unwrap();

        assert!(archivos.existe("informe"));
        assert_eq!(archivos.leer("informe").unwrap(), "");
        assert_eq!(archivos.listar(), vec!["informe".to_string()]);

        // volver a la raiz
        archivos.mover("informe", "").unwrap();
        assert!(archivos.dir_storage().join("informe").is_file());
    }

    #[test]
    fn test05_borrar_conserva_respaldo() {
        let (_dir, archivos) = archivos();
        archivos.crear("informe").unwrap();
        archivos.escribir_atomico("informe", "contenido\n").unwrap();
        archivos.actualizar_backup("informe", "contenido\n").unwrap();
        archivos.borrar("informe").unwrap();

        assert!(!archivos.existe("informe"));
        assert_eq!(
            fs::read_to_string(archivos.ruta_backup("informe")).unwrap(),
            "contenido\n"
        );
    }

    #[test]
    fn test06_checkpoints() {
        let (_dir, archivos) = archivos();
        archivos.crear("informe").unwrap();
        archivos.escribir_atomico("informe", "estable\n").unwrap();
        let tamanio = archivos.crear_checkpoint("informe", "v1").unwrap();
        assert_eq!(tamanio, 8);

        archivos.escribir_atomico("informe", "borrador roto\n").unwrap();
        assert_eq!(archivos.leer_checkpoint("informe", "v1").unwrap(), "estable\n");

        archivos.revertir_a_checkpoint("informe", "v1").unwrap();
        assert_eq!(archivos.leer("informe").unwrap(), "estable\n");
        assert!(archivos.leer_checkpoint("informe", "v9").is_err());
    }

    #[test]
    fn test07_los_checkpoints_no_se_anuncian() {
        let (_dir, archivos) = archivos();
        archivos.crear("a").unwrap();
        archivos.crear("b").unwrap();
        archivos.crear_checkpoint("a", "v1").unwrap();
        assert_eq!(archivos.listar(), vec!["a".to_string(), "b".to_string()]);
    }
}
