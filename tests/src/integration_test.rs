#[cfg(test)]
mod tests {
    use crate::utils::*;
    use docfs_client::driver::coordinator_driver::{CoordinatorDriver, Resolucion};
    use docfs_client::driver::node_driver::{NodeDriver, SesionEscritura};
    use docfs_client::protocol::codigo_resultado::CodigoResultado;
    use docfs_coordinator::coordinator_builder::CoordinatorBuilder;
    use std::fs;

    /// Abre una sesion de escritura siguiendo el referral del coordinator.
    fn sesion_escritura(
        driver: &mut CoordinatorDriver,
        usuario: &str,
        archivo: &str,
        oracion: u32,
    ) -> SesionEscritura {
        let (ip, puerto) = driver.escribir(archivo, oracion).unwrap();
        NodeDriver::connect(&ip, puerto)
            .unwrap()
            .abrir_escritura(usuario, archivo, oracion)
            .unwrap()
    }

    /// Lee el contenido siguiendo el referral si lo hay.
    fn leer_contenido(driver: &mut CoordinatorDriver, usuario: &str, archivo: &str) -> String {
        match driver.leer(archivo).unwrap() {
            Resolucion::Contenido(contenido) => contenido,
            Resolucion::Referral { ip, puerto } => NodeDriver::connect(&ip, puerto)
                .unwrap()
                .leer(usuario, archivo)
                .unwrap(),
        }
    }

    /// Escribe contenido nuevo al final de la oracion 0 y confirma.
    fn escribir_y_confirmar(
        driver: &mut CoordinatorDriver,
        usuario: &str,
        archivo: &str,
        texto: &str,
    ) -> String {
        let mut sesion = sesion_escritura(driver, usuario, archivo, 0);
        let palabras = sesion.oracion_actual().split_whitespace().count() as u32;
        sesion.insertar(palabras, texto).unwrap();
        sesion.confirmar().unwrap()
    }

    #[test]
    fn test_01_duenio_acl_y_lectura() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        let mut bob = cluster.cliente("bob");

        alice.crear("report", None).unwrap();
        alice.agregar_acceso("report", "bob", false).unwrap();

        // bob puede leer el archivo recien creado, que esta vacio
        assert_eq!(leer_contenido(&mut bob, "bob", "report"), "");

        // bob no es el duenio: no puede borrar
        let error = bob.borrar("report").unwrap_err();
        assert_eq!(error.codigo, Some(CodigoResultado::Denied));
        assert!(cluster.coordinator.registry().existe("report"));
    }

    #[test]
    fn test_02_escritura_con_division_dinamica() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("notas", None).unwrap();

        let mut sesion = sesion_escritura(&mut alice, "alice", "notas", 0);
        assert_eq!(sesion.oracion_actual(), "");
        sesion.insertar(0, "Hello world").unwrap();
        assert_eq!(sesion.confirmar().unwrap(), "Hello world\n");

        let mut sesion = sesion_escritura(&mut alice, "alice", "notas", 0);
        assert_eq!(sesion.oracion_actual(), "Hello world");

        // el punto al final de la oracion no la divide todavia
        assert_eq!(sesion.insertar(2, ".").unwrap(), "Hello world .");
        // "Bye" despues del cierre divide: la sesion sigue en la primera
        assert_eq!(sesion.insertar(3, "Bye").unwrap(), "Hello world .");

        assert_eq!(sesion.confirmar().unwrap(), "Hello world . Bye\n");
        assert_eq!(
            leer_contenido(&mut alice, "alice", "notas"),
            "Hello world . Bye\n"
        );
    }

    #[test]
    fn test_03_conflicto_de_lock_por_oracion() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("compartido", None).unwrap();

        let (ip, puerto) = alice.escribir("compartido", 0).unwrap();
        let _sesion_alice = NodeDriver::connect(&ip, puerto)
            .unwrap()
            .abrir_escritura("alice", "compartido", 0)
            .unwrap();

        let error = NodeDriver::connect(&ip, puerto)
            .unwrap()
            .abrir_escritura("bob", "compartido", 0)
            .unwrap_err();
        assert_eq!(error.codigo, Some(CodigoResultado::Locked));
        assert_eq!(error.message, "alice");
    }

    #[test]
    fn test_04_oracion_fuera_de_rango_informa_la_cantidad() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("dos_oraciones", None).unwrap();
        escribir_y_confirmar(&mut alice, "alice", "dos_oraciones", "Una. Dos.");

        let (ip, puerto) = alice.escribir("dos_oraciones", 5).unwrap();
        let error = NodeDriver::connect(&ip, puerto)
            .unwrap()
            .abrir_escritura("alice", "dos_oraciones", 5)
            .unwrap_err();
        assert_eq!(error.codigo, Some(CodigoResultado::SentenceOutOfRange));
        assert_eq!(error.limite, Some(2));
    }

    #[test]
    fn test_05_guardia_de_undo_consecutivo() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("versionado", None).unwrap();
        escribir_y_confirmar(&mut alice, "alice", "versionado", "primera version.");

        let deshacer = |driver: &mut CoordinatorDriver| {
            let (ip, puerto) = driver.deshacer("versionado").unwrap();
            NodeDriver::connect(&ip, puerto)
                .unwrap()
                .deshacer("alice", "versionado")
        };

        // primer undo vuelve al archivo vacio
        deshacer(&mut alice).unwrap();
        assert_eq!(leer_contenido(&mut alice, "alice", "versionado"), "");

        // el segundo consecutivo esta prohibido
        let error = deshacer(&mut alice).unwrap_err();
        assert_eq!(error.codigo, Some(CodigoResultado::Denied));

        // una escritura confirmada habilita el undo de nuevo
        escribir_y_confirmar(&mut alice, "alice", "versionado", "segunda version.");
        deshacer(&mut alice).unwrap();
        assert_eq!(leer_contenido(&mut alice, "alice", "versionado"), "");
    }

    #[test]
    fn test_06_fallback_por_backup_y_cache() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("critico", None).unwrap();
        escribir_y_confirmar(&mut alice, "alice", "critico", "contenido critico.");

        cluster.coordinator.nodos().marcar_fallado("n1");

        // cache vacia, backup presente: contenido inline y copia cacheada
        match alice.leer("critico").unwrap() {
            Resolucion::Contenido(contenido) => assert_eq!(contenido, "contenido critico.\n"),
            Resolucion::Referral { .. } => panic!("se esperaba contenido inline"),
        }
        assert!(cluster.dir_cache().join("critico").is_file());

        // la segunda lectura sale de la cache
        match alice.leer("critico").unwrap() {
            Resolucion::Contenido(contenido) => assert_eq!(contenido, "contenido critico.\n"),
            Resolucion::Referral { .. } => panic!("se esperaba contenido inline"),
        }
    }

    #[test]
    fn test_07_failover_reasigna_y_refiere() {
        let cluster = lanzar_cluster(2);
        let mut alice = cluster.cliente("alice");
        alice.crear("migrable", Some("n1")).unwrap();
        escribir_y_confirmar(&mut alice, "alice", "migrable", "datos viejos.");

        // sin cache ni backup, la caida de n1 obliga el failover
        let _ = fs::remove_file(cluster.dir_cache().join("migrable"));
        let _ = fs::remove_file(cluster.dir_backups().join("n1").join("migrable"));
        cluster.coordinator.nodos().marcar_fallado("n1");

        match alice.leer("migrable").unwrap() {
            Resolucion::Referral { ip, puerto } => {
                // el nuevo nodo materializa el archivo, sin los bytes
                let contenido = NodeDriver::connect(&ip, puerto)
                    .unwrap()
                    .leer("alice", "migrable")
                    .unwrap();
                assert_eq!(contenido, "");
            }
            Resolucion::Contenido(_) => panic!("se esperaba un referral"),
        }
        assert_eq!(
            cluster.coordinator.registry().obtener("migrable").unwrap().nodo,
            "n2"
        );
    }

    #[test]
    fn test_08_sesion_unica_por_usuario() {
        let cluster = lanzar_cluster(1);
        let primera = cluster.cliente("alice");

        let rechazo =
            CoordinatorDriver::connect("127.0.0.1", cluster.puerto, "alice").unwrap_err();
        assert!(rechazo.message.contains("sesion activa"));

        // cerrada la primera sesion, el usuario puede volver a entrar
        drop(primera);
        esperar(
            || CoordinatorDriver::connect("127.0.0.1", cluster.puerto, "alice").is_ok(),
            "la sesion no se libero tras el EOF",
        );
    }

    #[test]
    fn test_09_persistencia_sobrevive_al_reinicio() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        let _bob = cluster.cliente("bob");
        alice.crear("duradero", None).unwrap();
        alice.agregar_acceso("duradero", "bob", true).unwrap();
        alice.crear_carpeta("docs/2024").unwrap();

        cluster.coordinator.guardar_metadata().unwrap();

        let renacido = CoordinatorBuilder::new()
            .address("127.0.0.1:0")
            .registry_file(cluster.ruta_registry())
            .directorios(cluster.dir_cache(), cluster.dir_backups())
            .build()
            .unwrap();
        let ficha = renacido.registry().obtener("duradero").unwrap();
        assert_eq!(ficha.duenio, "alice");
        assert!(ficha.puede_escribir("bob"));
        assert!(ficha.puede_leer("bob"));
    }

    #[test]
    fn test_10_busqueda_se_invalida_con_altas() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("informe_enero", None).unwrap();

        let resultados = alice.buscar("informe").unwrap();
        assert!(resultados.contains("informe_enero"));

        // el alta purga la cache: la misma consulta ve el archivo nuevo
        alice.crear("informe_febrero", None).unwrap();
        let resultados = alice.buscar("informe").unwrap();
        assert!(resultados.contains("informe_febrero"));

        // la baja tambien invalida
        alice.borrar("informe_enero").unwrap();
        let resultados = alice.buscar("informe").unwrap();
        assert!(!resultados.contains("informe_enero"));
    }

    #[test]
    fn test_11_solicitudes_de_acceso() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        let mut bob = cluster.cliente("bob");
        alice.crear("privado", None).unwrap();
        escribir_y_confirmar(&mut alice, "alice", "privado", "solo para aprobados.");

        let error = bob.leer("privado").unwrap_err();
        assert_eq!(error.codigo, Some(CodigoResultado::Denied));

        bob.solicitar_acceso("privado", 1).unwrap();
        // una segunda solicitud pendiente del mismo par se rechaza
        let repetida = bob.solicitar_acceso("privado", 3).unwrap_err();
        assert_eq!(repetida.codigo, Some(CodigoResultado::Exists));

        let listado = alice.ver_solicitudes("privado").unwrap();
        assert!(listado.contains("bob"));

        alice.responder_solicitud("privado", 1, true).unwrap();
        assert_eq!(
            leer_contenido(&mut bob, "bob", "privado"),
            "solo para aprobados.\n"
        );
    }

    #[test]
    fn test_12_carpetas_y_move_fisico() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("mudable", None).unwrap();
        escribir_y_confirmar(&mut alice, "alice", "mudable", "contenido mudado.");

        // mover a una carpeta inexistente falla
        let error = alice.mover("mudable", "docs").unwrap_err();
        assert_eq!(error.codigo, Some(CodigoResultado::FolderMissing));

        alice.crear_carpeta("docs").unwrap();
        alice.mover("mudable", "docs").unwrap();

        let listado = alice.ver_carpeta("docs").unwrap();
        assert!(listado.contains("mudable"));
        // el archivo movido en disco sigue resolviendose por nombre
        assert_eq!(
            leer_contenido(&mut alice, "alice", "mudable"),
            "contenido mudado.\n"
        );
        assert!(cluster
            .dir_storage()
            .join("n1")
            .join("docs")
            .join("mudable")
            .is_file());
    }

    #[test]
    fn test_13_checkpoints_y_revert() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("historiado", None).unwrap();
        escribir_y_confirmar(&mut alice, "alice", "historiado", "version estable.");

        alice.checkpoint("historiado", "v1").unwrap();
        // el tag es unico por archivo
        let repetido = alice.checkpoint("historiado", "v1").unwrap_err();
        assert_eq!(repetido.codigo, Some(CodigoResultado::Exists));

        escribir_y_confirmar(&mut alice, "alice", "historiado", "borrador roto.");
        assert_eq!(
            alice.ver_checkpoint("historiado", "v1").unwrap(),
            "version estable.\n"
        );

        alice.revertir("historiado", "v1").unwrap();
        assert_eq!(
            leer_contenido(&mut alice, "alice", "historiado"),
            "version estable.\n"
        );
        assert!(alice.listar_checkpoints("historiado").unwrap().contains("v1"));

        let inexistente = alice.revertir("historiado", "v9").unwrap_err();
        assert_eq!(inexistente.codigo, Some(CodigoResultado::CheckpointNotFound));
    }

    #[test]
    fn test_14_stream_palabra_a_palabra() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("transmitido", None).unwrap();
        escribir_y_confirmar(&mut alice, "alice", "transmitido", "Hola mundo.");

        let (ip, puerto) = match alice.stream("transmitido").unwrap() {
            Resolucion::Referral { ip, puerto } => (ip, puerto),
            Resolucion::Contenido(_) => panic!("se esperaba un referral"),
        };
        let mut palabras = Vec::new();
        NodeDriver::connect(&ip, puerto)
            .unwrap()
            .stream("alice", "transmitido", |palabra| {
                palabras.push(palabra.to_string());
            })
            .unwrap();
        assert_eq!(palabras, vec!["Hola", "mundo.", "\n"]);
    }

    #[test]
    fn test_15_view_y_marcadores() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        let mut bob = cluster.cliente("bob");
        alice.crear("visible", None).unwrap();

        assert!(alice.ver(false, false).unwrap().contains("[O] visible"));
        // sin acceso, bob solo lo ve pidiendo todos
        assert!(!bob.ver(false, false).unwrap().contains("visible"));
        assert!(bob.ver(true, false).unwrap().contains("[-] visible"));

        alice.agregar_acceso("visible", "bob", false).unwrap();
        assert!(bob.ver(false, false).unwrap().contains("[R] visible"));
    }

    #[test]
    fn test_16_registro_de_nodo_preserva_metadata() {
        let cluster = lanzar_cluster(1);
        let mut alice = cluster.cliente("alice");
        alice.crear("persistente", None).unwrap();

        // un nodo nuevo que anuncia archivos desconocidos los adopta
        // como del sistema
        fs::create_dir_all(cluster.dir_storage().join("n9")).unwrap();
        fs::write(cluster.dir_storage().join("n9").join("heredado"), "viejo\n").unwrap();
        cluster.lanzar_nodo("n9");

        esperar(
            || cluster.coordinator.registry().existe("heredado"),
            "el archivo anunciado no se adopto",
        );
        let ficha = cluster.coordinator.registry().obtener("heredado").unwrap();
        assert_eq!(ficha.duenio, "system");
        assert_eq!(ficha.nodo, "n9");
        // la ficha del archivo previo no se toco
        assert_eq!(
            cluster.coordinator.registry().obtener("persistente").unwrap().duenio,
            "alice"
        );
    }
}
