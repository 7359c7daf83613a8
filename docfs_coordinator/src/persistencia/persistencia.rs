//! Este modulo contiene la persistencia de la metadata del coordinator:
//! un snapshot de texto linea por linea con los archivos, sus ACLs, su
//! indice de checkpoints y las carpetas, que sobrevive a los reinicios
use crate::registro::archivo::{EntradaAcl, FichaArchivo, RegistroCheckpoint};
use crate::registro::carpetas::{FichaCarpeta, FolderManager};
use crate::registro::registry::Registry;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const ENCABEZADO: &str = "REGISTRY_V1";

/// Guarda el snapshot completo de la metadata.
///
/// Formato: encabezado y cantidad de archivos; por archivo una linea
/// `FILE:` seguida de sus `ACL:` y `CHK:` y un `END`; al final una seccion
/// de lineas `FOLDER:`. Los nombres no admiten `:` (se valida en el alta).
///
/// # Parametros
/// * `ruta`: archivo de persistencia destino
/// * `registry`: registro de archivos a volcar
/// * `carpetas`: arbol de carpetas a volcar
pub fn guardar_registro(
    ruta: &Path,
    registry: &Registry,
    carpetas: &FolderManager,
) -> io::Result<()> {
    let archivo = File::create(ruta)?;
    let mut writer = BufWriter::new(archivo);

    let fichas = registry.listar();
    writeln!(writer, "{ENCABEZADO}")?;
    writeln!(writer, "{}", fichas.len())?;

    for ficha in &fichas {
        guardar_ficha(&mut writer, ficha)?;
    }
    for carpeta in carpetas.listar() {
        writeln!(
            writer,
            "FOLDER:{}:{}:{}",
            carpeta.ruta, carpeta.duenio, carpeta.creada_en
        )?;
    }
    writer.flush()
}

/// Escribe la seccion de una ficha: `FILE:` con sus `ACL:`/`CHK:` y `END`.
fn guardar_ficha(writer: &mut BufWriter<File>, ficha: &FichaArchivo) -> io::Result<()> {
    writeln!(
        writer,
        "FILE:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
        ficha.nombre,
        ficha.duenio,
        ficha.nodo,
        ficha.creado_en,
        ficha.modificado_en,
        ficha.accedido_en,
        ficha.tamanio,
        ficha.palabras,
        ficha.caracteres,
        ficha.carpeta,
    )?;

    let mut usuarios: Vec<&String> = ficha.acl.keys().collect();
    usuarios.sort();
    for usuario in usuarios {
        let entrada = &ficha.acl[usuario];
        writeln!(
            writer,
            "ACL:{usuario}:{}:{}",
            entrada.puede_leer as i32, entrada.puede_escribir as i32
        )?;
    }

    let mut tags: Vec<&String> = ficha.checkpoints.keys().collect();
    tags.sort();
    for tag in tags {
        let checkpoint = &ficha.checkpoints[tag];
        writeln!(
            writer,
            "CHK:{tag}:{}:{}:{}",
            checkpoint.creador, checkpoint.creado_en, checkpoint.tamanio
        )?;
    }

    writeln!(writer, "END")
}

/// Carga el snapshot de la metadata si existe.
///
/// # Retorna
/// - `Ok(cantidad de archivos cargados)`; 0 si el archivo no existe
/// - `Err` ante un formato invalido o un fallo de E/S
pub fn cargar_registro(
    ruta: &Path,
    registry: &Registry,
    carpetas: &FolderManager,
) -> io::Result<usize> {
    if !ruta.is_file() {
        return Ok(0);
    }
    let archivo = File::open(ruta)?;
    let reader = BufReader::new(archivo);
    let mut lineas = reader.lines();

    let encabezado = lineas.next().transpose()?.unwrap_or_default();
    if encabezado.trim() != ENCABEZADO {
        return Err(formato_invalido("encabezado desconocido"));
    }
    // la cantidad declarada solo se usa como control
    let declarados: usize = lineas
        .next()
        .transpose()?
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(|_| formato_invalido("cantidad de archivos invalida"))?;

    let mut cargados = 0;
    let mut ficha_actual: Option<FichaArchivo> = None;

    for linea in lineas {
        let linea = linea?;
        if let Some(resto) = linea.strip_prefix("FILE:") {
            ficha_actual = Some(parsear_ficha(resto)?);
        } else if let Some(resto) = linea.strip_prefix("ACL:") {
            if let Some(ficha) = ficha_actual.as_mut() {
                parsear_acl(resto, ficha)?;
            }
        } else if let Some(resto) = linea.strip_prefix("CHK:") {
            if let Some(ficha) = ficha_actual.as_mut() {
                parsear_checkpoint(resto, ficha)?;
            }
        } else if linea.trim() == "END" {
            if let Some(ficha) = ficha_actual.take() {
                if registry.agregar(ficha).is_ok() {
                    cargados += 1;
                }
            }
        } else if let Some(resto) = linea.strip_prefix("FOLDER:") {
            carpetas.restaurar(parsear_carpeta(resto)?);
        }
    }

    if cargados != declarados {
        return Err(formato_invalido("la cantidad declarada no coincide"));
    }
    Ok(cargados)
}

fn parsear_ficha(linea: &str) -> io::Result<FichaArchivo> {
    let campos: Vec<&str> = linea.split(':').collect();
    if campos.len() != 10 {
        return Err(formato_invalido("linea FILE incompleta"));
    }
    let mut ficha = FichaArchivo::nueva(campos[0], campos[1], campos[2]);
    ficha.creado_en = parsear_entero(campos[3])?;
    ficha.modificado_en = parsear_entero(campos[4])?;
    ficha.accedido_en = parsear_entero(campos[5])?;
    ficha.tamanio = parsear_entero(campos[6])?;
    ficha.palabras = parsear_entero(campos[7])? as i32;
    ficha.caracteres = parsear_entero(campos[8])? as i32;
    ficha.carpeta = campos[9].to_string();
    Ok(ficha)
}

fn parsear_acl(linea: &str, ficha: &mut FichaArchivo) -> io::Result<()> {
    let campos: Vec<&str> = linea.split(':').collect();
    if campos.len() != 3 {
        return Err(formato_invalido("linea ACL incompleta"));
    }
    let entrada = EntradaAcl {
        puede_leer: campos[1] == "1",
        puede_escribir: campos[2] == "1",
    };
    ficha.acl.insert(campos[0].to_string(), entrada);
    Ok(())
}

fn parsear_checkpoint(linea: &str, ficha: &mut FichaArchivo) -> io::Result<()> {
    let campos: Vec<&str> = linea.split(':').collect();
    if campos.len() != 4 {
        return Err(formato_invalido("linea CHK incompleta"));
    }
    ficha.checkpoints.insert(
        campos[0].to_string(),
        RegistroCheckpoint {
            tag: campos[0].to_string(),
            creador: campos[1].to_string(),
            creado_en: parsear_entero(campos[2])?,
            tamanio: parsear_entero(campos[3])?,
        },
    );
    Ok(())
}

fn parsear_carpeta(linea: &str) -> io::Result<FichaCarpeta> {
    let campos: Vec<&str> = linea.split(':').collect();
    if campos.len() != 3 {
        return Err(formato_invalido("linea FOLDER incompleta"));
    }
    Ok(FichaCarpeta {
        ruta: campos[0].to_string(),
        duenio: campos[1].to_string(),
        creada_en: parsear_entero(campos[2])?,
    })
}

fn parsear_entero(campo: &str) -> io::Result<i64> {
    campo
        .parse()
        .map_err(|_| formato_invalido("entero invalido"))
}

fn formato_invalido(detalle: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("registro persistido invalido: {detalle}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfs_client::protocol::constantes::{ACCESO_ESCRITURA, ACCESO_LECTURA};
    use tempfile::TempDir;

    #[test]
    fn test01_ida_y_vuelta_completa() {
        let dir = TempDir::new().unwrap();
        let ruta = dir.path().join("registry.dat");

        let registry = Registry::new();
        let carpetas = FolderManager::new();
        carpetas.crear("docs/2024", "alice").unwrap();

        let mut ficha = FichaArchivo::nueva("informe", "alice", "n1");
        ficha.carpeta = "docs/2024".to_string();
        ficha.tamanio = 120;
        ficha.palabras = 20;
        ficha.caracteres = 95;
        ficha.otorgar(
            "bob",
            EntradaAcl::desde_mascara(ACCESO_LECTURA | ACCESO_ESCRITURA),
        );
        ficha.checkpoints.insert(
            "v1".to_string(),
            RegistroCheckpoint {
                tag: "v1".to_string(),
                creador: "alice".to_string(),
                creado_en: 1000,
                tamanio: 80,
            },
        );
        registry.agregar(ficha.clone()).unwrap();
        registry
            .agregar(FichaArchivo::nueva("notas", "bob", "n2"))
            .unwrap();

        guardar_registro(&ruta, &registry, &carpetas).unwrap();

        let restaurado = Registry::new();
        let carpetas_restauradas = FolderManager::new();
        let cargados = cargar_registro(&ruta, &restaurado, &carpetas_restauradas).unwrap();
        assert_eq!(cargados, 2);

        let recuperada = restaurado.obtener("informe").unwrap();
        assert_eq!(recuperada, ficha);
        assert!(carpetas_restauradas.existe("docs"));
        assert!(carpetas_restauradas.existe("docs/2024"));
    }

    #[test]
    fn test02_sin_archivo_no_es_error() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::new();
        let carpetas = FolderManager::new();
        let cargados =
            cargar_registro(&dir.path().join("no_existe.dat"), &registry, &carpetas).unwrap();
        assert_eq!(cargados, 0);
    }

    #[test]
    fn test03_encabezado_invalido() {
        let dir = TempDir::new().unwrap();
        let ruta = dir.path().join("roto.dat");
        std::fs::write(&ruta, "OTRA_COSA\n0\n").unwrap();
        assert!(cargar_registro(&ruta, &Registry::new(), &FolderManager::new()).is_err());
    }
}
