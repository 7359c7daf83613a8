//! Este modulo contiene las operaciones de archivos del router: alta,
//! lectura con su cadena de fallback, stream, referrals de escritura y
//! undo, baja, listado e info
use crate::comandos::utils::{formatear_fecha, nombre_valido};
use crate::coordinator::Coordinator;
use crate::log_msj::log_mensajes::log_failover;
use crate::registro::archivo::FichaArchivo;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::constantes::{VIEW_DETALLE, VIEW_TODOS};
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::payloads::EstadisticasArchivo;
use docfs_client::protocol::protocol_trait::DeserializeDFP;
use docfs_client::protocol::trama::Trama;
use docfs_client::protocol::utils::recortar_payload;
use std::fs;
use std::io::Cursor;

impl Coordinator {
    /// CREATE: elige nodo (explicito en el payload o el primero disponible
    /// por orden de registro), ordena el alta por control y registra la
    /// ficha con el solicitante como duenio.
    pub(crate) fn op_create(&self, pedido: &Trama) -> Trama {
        let nombre = &pedido.filename;
        if !nombre_valido(nombre) {
            return pedido.responder(CodigoResultado::BadRequest, "Nombre de archivo invalido");
        }
        if self.registry.existe(nombre) {
            return pedido.responder(
                CodigoResultado::Exists,
                &format!("El archivo '{nombre}' ya existe"),
            );
        }

        let eleccion = pedido.data_texto();
        let nodo = if eleccion.is_empty() {
            match self.nodos.primero_disponible() {
                Some(nodo) => nodo,
                None => {
                    return pedido.responder(
                        CodigoResultado::Unavailable,
                        "No hay nodos de almacenamiento disponibles",
                    );
                }
            }
        } else {
            match self.nodos.obtener(eleccion.trim()) {
                Some(nodo) if nodo.disponible() => nodo,
                Some(_) => {
                    return pedido.responder(
                        CodigoResultado::Unavailable,
                        &format!("El nodo '{}' no esta disponible", eleccion.trim()),
                    );
                }
                None => {
                    return pedido.responder(
                        CodigoResultado::NotFound,
                        &format!("No se conoce el nodo '{}'", eleccion.trim()),
                    );
                }
            }
        };

        let control = Trama::nueva(Opcode::Create, &pedido.username).con_archivo(nombre);
        let respuesta_nodo = match self.pedir_o_unavailable(&nodo, &control, pedido) {
            Ok(respuesta) => respuesta,
            Err(unavailable) => return unavailable,
        };
        if let Some(codigo) = respuesta_nodo.resultado() {
            if !codigo.es_exito() {
                return pedido.responder(codigo, &respuesta_nodo.data_texto());
            }
        }

        if self
            .registry
            .agregar(FichaArchivo::nueva(nombre, &pedido.username, &nodo.id))
            .is_err()
        {
            return pedido.responder(
                CodigoResultado::Exists,
                &format!("El archivo '{nombre}' ya existe"),
            );
        }
        self.busqueda.invalidar();
        self.replicar_mutacion(nombre, &nodo.id);
        self.logger.info(
            &format!(
                "archivo '{nombre}' creado por '{}' en el nodo '{}'",
                pedido.username, nodo.id
            ),
            "CREATE",
        );
        pedido.responder(
            CodigoResultado::Success,
            &format!("Archivo '{nombre}' creado en el nodo '{}'", nodo.id),
        )
    }

    /// READ: referral al nodo duenio si esta vivo; si no, cadena de
    /// fallback cache -> backup -> failover, y recien entonces
    /// `Unavailable`.
    pub(crate) fn op_read(&self, pedido: &Trama) -> Trama {
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
        self.registry.modificar(&ficha.nombre, |f| {
            f.accedido_en = chrono::Local::now().timestamp();
        });

        if let Some(nodo) = self.nodo_disponible_de(&ficha) {
            return pedido.responder_referral(&nodo.ip, nodo.puerto_cliente);
        }
        self.resolver_contenido_sin_nodo(pedido, &ficha)
    }

    /// STREAM: misma resolucion que READ; bajo fallback el contenido va
    /// entero en una sola trama.
    pub(crate) fn op_stream(&self, pedido: &Trama) -> Trama {
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
        self.registry.modificar(&ficha.nombre, |f| {
            f.accedido_en = chrono::Local::now().timestamp();
        });

        if let Some(nodo) = self.nodo_disponible_de(&ficha) {
            return pedido.responder_referral(&nodo.ip, nodo.puerto_cliente);
        }
        self.resolver_contenido_sin_nodo(pedido, &ficha)
    }

    /// Cadena de fallback de lectura con el nodo duenio caido:
    /// 1. la cache del coordinator,
    /// 2. el respaldo por nodo (que ademas se copia a la cache),
    /// 3. failover: reasignar el archivo a otro nodo disponible y referir,
    /// 4. `Unavailable`.
    fn resolver_contenido_sin_nodo(&self, pedido: &Trama, ficha: &FichaArchivo) -> Trama {
        let ruta_cache = self.config.cache_dir.join(&ficha.nombre);
        if let Ok(contenido) = fs::read_to_string(&ruta_cache) {
            return pedido.responder(CodigoResultado::Data, recortar_payload(&contenido));
        }

        let ruta_backup = self.config.backup_dir.join(&ficha.nodo).join(&ficha.nombre);
        if let Ok(contenido) = fs::read_to_string(&ruta_backup) {
            if fs::write(&ruta_cache, &contenido).is_err() {
                self.logger.warn(
                    &format!("no se pudo cachear '{}'", ficha.nombre),
                    "FALLBACK",
                );
            }
            return pedido.responder(CodigoResultado::Data, recortar_payload(&contenido));
        }

        if let Some(nuevo) = self.nodos.otro_disponible(&ficha.nodo) {
            self.registry.modificar(&ficha.nombre, |f| {
                f.nodo = nuevo.id.clone();
            });
            log_failover(&self.logger, &ficha.nombre, &ficha.nodo, &nuevo.id);
            // el nuevo nodo materializa al menos un archivo vacio; los
            // bytes no se re-siembran porque la replicacion es un stub
            let alta = Trama::nueva(Opcode::Create, &pedido.username).con_archivo(&ficha.nombre);
            let _ = self.pedir_o_unavailable(&nuevo, &alta, pedido);
            return pedido.responder_referral(&nuevo.ip, nuevo.puerto_cliente);
        }

        self.sin_nodo(pedido, ficha)
    }

    /// WRITE: exige permiso de escritura y responde siempre con referral;
    /// el contenido nunca pasa por el coordinator.
    pub(crate) fn op_write(&self, pedido: &Trama) -> Trama {
        self.referral_de_escritura(pedido)
    }

    /// UNDO: mismas reglas que WRITE.
    pub(crate) fn op_undo(&self, pedido: &Trama) -> Trama {
        self.referral_de_escritura(pedido)
    }

    fn referral_de_escritura(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if !ficha.puede_escribir(&pedido.username) {
            return pedido.responder(
                CodigoResultado::Denied,
                &format!("'{}' no puede escribir '{}'", pedido.username, ficha.nombre),
            );
        }
        match self.nodo_disponible_de(&ficha) {
            Some(nodo) => {
                self.registry.modificar(&ficha.nombre, |f| {
                    f.modificado_en = chrono::Local::now().timestamp();
                });
                pedido.responder_referral(&nodo.ip, nodo.puerto_cliente)
            }
            None => self.sin_nodo(pedido, &ficha),
        }
    }

    /// DELETE: solo el duenio; ordena la baja al nodo, quita la ficha y
    /// purga solicitudes, cache de busquedas y cache de contenidos.
    pub(crate) fn op_delete(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if pedido.username != ficha.duenio {
            return pedido.responder(
                CodigoResultado::Denied,
                &format!("Solo el duenio puede borrar '{}'", ficha.nombre),
            );
        }
        let nodo = match self.nodo_disponible_de(&ficha) {
            Some(nodo) => nodo,
            None => return self.sin_nodo(pedido, &ficha),
        };

        let control = Trama::nueva(Opcode::Delete, &pedido.username).con_archivo(&ficha.nombre);
        let respuesta_nodo = match self.pedir_o_unavailable(&nodo, &control, pedido) {
            Ok(respuesta) => respuesta,
            Err(unavailable) => return unavailable,
        };
        // un NotFound del nodo no bloquea la baja de la metadata
        if let Some(codigo) = respuesta_nodo.resultado() {
            if !codigo.es_exito() && codigo != CodigoResultado::NotFound {
                return pedido.responder(codigo, &respuesta_nodo.data_texto());
            }
        }

        self.registry.quitar(&ficha.nombre);
        self.solicitudes.descartar_de(&ficha.nombre);
        self.busqueda.invalidar();
        let _ = fs::remove_file(self.config.cache_dir.join(&ficha.nombre));
        self.replicar_mutacion(&ficha.nombre, &nodo.id);
        self.logger.info(
            &format!("archivo '{}' borrado por su duenio", ficha.nombre),
            "DELETE",
        );
        pedido.responder(
            CodigoResultado::Success,
            &format!("Archivo '{}' borrado", ficha.nombre),
        )
    }

    /// VIEW: listado de archivos con marcador de acceso; `a` incluye los
    /// inaccesibles y `l` agrega estadisticas refrescadas contra los nodos
    /// vivos.
    pub(crate) fn op_view(&self, pedido: &Trama) -> Trama {
        let todos = pedido.flags & VIEW_TODOS != 0;
        let detalle = pedido.flags & VIEW_DETALLE != 0;

        if detalle {
            self.refrescar_estadisticas();
        }

        let mut lineas = Vec::new();
        for ficha in self.registry.listar() {
            let marcador = ficha.marcador_acceso(&pedido.username);
            if marcador == '-' && !todos {
                continue;
            }
            if detalle {
                lineas.push(format!(
                    "[{marcador}] {}  carpeta='{}'  {} bytes, {} palabras, {} caracteres",
                    ficha.nombre, ficha.carpeta, ficha.tamanio, ficha.palabras, ficha.caracteres
                ));
            } else {
                lineas.push(format!("[{marcador}] {}", ficha.nombre));
            }
        }

        if lineas.is_empty() {
            return pedido.responder(CodigoResultado::Success, "No hay archivos para mostrar");
        }
        pedido.responder(CodigoResultado::Success, &lineas.join("\n"))
    }

    /// Refresca las estadisticas cacheadas preguntando a cada nodo vivo
    /// por el canal de control.
    fn refrescar_estadisticas(&self) {
        for ficha in self.registry.listar() {
            let Some(nodo) = self.nodo_disponible_de(&ficha) else {
                continue;
            };
            let control = Trama::nueva(Opcode::Info, "system").con_archivo(&ficha.nombre);
            let Ok(respuesta) = crate::cluster::control::pedir_a_nodo(&nodo, &control) else {
                continue;
            };
            if respuesta.resultado().map(|c| c.es_exito()) != Some(true) {
                continue;
            }
            let Ok(stats) =
                EstadisticasArchivo::deserialize(&mut Cursor::new(respuesta.data.as_slice()))
            else {
                continue;
            };
            self.registry.modificar(&ficha.nombre, |f| {
                f.tamanio = stats.size;
                f.palabras = stats.word_count;
                f.caracteres = stats.char_count;
            });
        }
    }

    /// INFO: metadata completa de un archivo; las estadisticas se
    /// refrescan contra el nodo vivo o, caido este, desde el respaldo.
    pub(crate) fn op_info(&self, pedido: &Trama) -> Trama {
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

        let stats = match self.nodo_disponible_de(&ficha) {
            Some(nodo) => {
                let control = Trama::nueva(Opcode::Info, "system").con_archivo(&ficha.nombre);
                crate::cluster::control::pedir_a_nodo(&nodo, &control)
                    .ok()
                    .filter(|r| r.resultado().map(|c| c.es_exito()) == Some(true))
                    .and_then(|r| {
                        EstadisticasArchivo::deserialize(&mut Cursor::new(r.data.as_slice())).ok()
                    })
            }
            None => {
                let ruta = self.config.backup_dir.join(&ficha.nodo).join(&ficha.nombre);
                fs::read_to_string(ruta)
                    .ok()
                    .map(|contenido| EstadisticasArchivo::desde_contenido(&contenido))
            }
        };

        let ficha = match stats {
            Some(stats) => {
                self.registry.modificar(&ficha.nombre, |f| {
                    f.tamanio = stats.size;
                    f.palabras = stats.word_count;
                    f.caracteres = stats.char_count;
                });
                self.registry.obtener(&ficha.nombre).unwrap_or(ficha)
            }
            None => ficha,
        };

        let mut accesos: Vec<String> = ficha
            .acl
            .iter()
            .map(|(usuario, entrada)| {
                let permiso = if entrada.puede_escribir { "RW" } else { "R" };
                format!("{usuario}={permiso}")
            })
            .collect();
        accesos.sort();
        let accesos = if accesos.is_empty() {
            "sin accesos otorgados".to_string()
        } else {
            accesos.join(", ")
        };

        let carpeta = if ficha.carpeta.is_empty() {
            "(raiz)".to_string()
        } else {
            ficha.carpeta.clone()
        };

        let detalle = format!(
            "Archivo: {}\nDuenio: {}\nNodo: {}\nCarpeta: {}\nCreado: {}\nModificado: {}\nAccedido: {}\nTamanio: {} bytes\nPalabras: {}\nCaracteres: {}\nAccesos: {}\nCheckpoints: {}",
            ficha.nombre,
            ficha.duenio,
            ficha.nodo,
            carpeta,
            formatear_fecha(ficha.creado_en),
            formatear_fecha(ficha.modificado_en),
            formatear_fecha(ficha.accedido_en),
            ficha.tamanio,
            ficha.palabras,
            ficha.caracteres,
            accesos,
            ficha.checkpoints.len(),
        );
        pedido.responder(CodigoResultado::Success, &detalle)
    }
}
