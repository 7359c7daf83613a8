//! Este modulo contiene los listados directos de la metadata (usuarios,
//! nodos, busquedas cacheadas) y la ejecucion remota opcional
use crate::comandos::utils::formatear_fecha;
use crate::coordinator::Coordinator;
use crate::registro::busqueda::resolver_busqueda;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::trama::Trama;

impl Coordinator {
    /// LIST: usuarios registrados con su fecha de alta.
    pub(crate) fn op_list_users(&self, pedido: &Trama) -> Trama {
        let usuarios = self.usuarios.listar();
        if usuarios.is_empty() {
            return pedido.responder(CodigoResultado::Success, "No hay usuarios registrados");
        }
        let lineas: Vec<String> = usuarios
            .iter()
            .map(|(usuario, alta)| format!("{usuario} (registrado {})", formatear_fecha(*alta)))
            .collect();
        pedido.responder(CodigoResultado::Success, &lineas.join("\n"))
    }

    /// LISTSS: nodos conocidos en orden de registro, con su estado.
    pub(crate) fn op_list_nodes(&self, pedido: &Trama) -> Trama {
        let nodos = self.nodos.listar();
        if nodos.is_empty() {
            return pedido.responder(CodigoResultado::Success, "No hay nodos registrados");
        }
        let lineas: Vec<String> = nodos
            .iter()
            .map(|nodo| {
                let estado = if nodo.disponible() { "ACTIVO" } else { "CAIDO" };
                format!(
                    "{} {}:{} (control {}) {estado}",
                    nodo.id, nodo.ip, nodo.puerto_cliente, nodo.puerto_control
                )
            })
            .collect();
        pedido.responder(CodigoResultado::Success, &lineas.join("\n"))
    }

    /// SEARCH: resuelve el patron contra la cache LRU o barriendo el
    /// registro, filtrado por permiso de lectura.
    pub(crate) fn op_search(&self, pedido: &Trama) -> Trama {
        let patron = pedido.data_texto().trim().to_string();
        if patron.is_empty() {
            return pedido.responder(CodigoResultado::BadRequest, "Falta el patron de busqueda");
        }

        if let Some(resultados) = self.busqueda.buscar(&pedido.username, &patron) {
            return pedido.responder(CodigoResultado::Success, &resultados);
        }

        let coincidencias =
            resolver_busqueda(&self.registry.listar(), &pedido.username, &patron);
        let resultados = if coincidencias.is_empty() {
            format!("Sin coincidencias para '{patron}'")
        } else {
            coincidencias.join("\n")
        };
        self.busqueda.insertar(&pedido.username, &patron, &resultados);
        pedido.responder(CodigoResultado::Success, &resultados)
    }

    /// EXEC: trae el contenido del archivo por un canal de datos fresco,
    /// lo ejecuta como script de shell y devuelve la salida combinada.
    /// Solo compila con la feature `exec`; apagada, la operacion se
    /// rechaza.
    #[cfg(feature = "exec")]
    pub(crate) fn op_exec(&self, pedido: &Trama) -> Trama {
        use docfs_client::driver::node_driver::NodeDriver;
        use docfs_client::protocol::utils::recortar_payload;
        use std::process::Command;

        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if !ficha.puede_leer(&pedido.username) {
            return pedido.responder(
                CodigoResultado::Denied,
                &format!("'{}' no puede leer '{}'", pedido.username, ficha.nombre),
            );
        }

        let contenido = match self.nodo_disponible_de(&ficha) {
            Some(nodo) => NodeDriver::connect(&nodo.ip, nodo.puerto_cliente)
                .and_then(|mut canal| canal.leer(&pedido.username, &ficha.nombre)),
            None => {
                let ruta = self.config.backup_dir.join(&ficha.nodo).join(&ficha.nombre);
                std::fs::read_to_string(ruta).map_err(|e| {
                    docfs_client::driver::driver_error::DriverError::other(e.to_string())
                })
            }
        };
        let contenido = match contenido {
            Ok(contenido) => contenido,
            Err(_) => return self.sin_nodo(pedido, &ficha),
        };

        let ruta_script = std::env::temp_dir().join(format!(
            "docfs_exec_{}_{}",
            std::process::id(),
            chrono::Local::now().timestamp_micros()
        ));
        if std::fs::write(&ruta_script, &contenido).is_err() {
            return pedido.responder(
                CodigoResultado::ServerError,
                "No se pudo preparar el script temporal",
            );
        }

        let salida = Command::new("sh").arg(&ruta_script).output();
        let _ = std::fs::remove_file(&ruta_script);

        match salida {
            Ok(salida) => {
                let mut combinada = String::from_utf8_lossy(&salida.stdout).to_string();
                combinada.push_str(&String::from_utf8_lossy(&salida.stderr));
                self.logger.info(
                    &format!("script '{}' ejecutado por '{}'", ficha.nombre, pedido.username),
                    "EXEC",
                );
                pedido.responder(CodigoResultado::Data, recortar_payload(&combinada))
            }
            Err(e) => pedido.responder(
                CodigoResultado::ServerError,
                &format!("No se pudo ejecutar el script: {e}"),
            ),
        }
    }

    /// EXEC sin la feature `exec`: operacion deshabilitada.
    #[cfg(not(feature = "exec"))]
    pub(crate) fn op_exec(&self, pedido: &Trama) -> Trama {
        pedido.responder(
            CodigoResultado::BadRequest,
            "EXEC esta deshabilitado en esta compilacion",
        )
    }
}
