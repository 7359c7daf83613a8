//! Este modulo contiene las operaciones de checkpoints: el coordinator
//! lleva el indice y el nodo materializa las copias de bytes
use crate::comandos::utils::{formatear_fecha, tag_valido};
use crate::coordinator::Coordinator;
use crate::registro::archivo::RegistroCheckpoint;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::payloads::EstadisticasArchivo;
use docfs_client::protocol::protocol_trait::DeserializeDFP;
use docfs_client::protocol::trama::Trama;
use std::io::Cursor;

impl Coordinator {
    /// CHECKPOINT: el duenio o un escritor etiqueta el contenido actual;
    /// el tag es unico por archivo y la copia la hace el nodo.
    pub(crate) fn op_checkpoint(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if !ficha.puede_escribir(&pedido.username) {
            return pedido.responder(
                CodigoResultado::Denied,
                "Hace falta permiso de escritura para crear checkpoints",
            );
        }
        let tag = pedido.checkpoint_tag.trim();
        if !tag_valido(tag) {
            return pedido.responder(CodigoResultado::BadRequest, "Tag de checkpoint invalido");
        }
        if ficha.checkpoints.contains_key(tag) {
            return pedido.responder(
                CodigoResultado::Exists,
                &format!("El checkpoint '{tag}' ya existe para '{}'", ficha.nombre),
            );
        }
        let nodo = match self.nodo_disponible_de(&ficha) {
            Some(nodo) => nodo,
            None => return self.sin_nodo(pedido, &ficha),
        };

        let control = Trama::nueva(Opcode::Checkpoint, &pedido.username)
            .con_archivo(&ficha.nombre)
            .con_tag(tag);
        let respuesta_nodo = match self.pedir_o_unavailable(&nodo, &control, pedido) {
            Ok(respuesta) => respuesta,
            Err(unavailable) => return unavailable,
        };
        if let Some(codigo) = respuesta_nodo.resultado() {
            if !codigo.es_exito() {
                return pedido.responder(codigo, &respuesta_nodo.data_texto());
            }
        }

        let tamanio =
            EstadisticasArchivo::deserialize(&mut Cursor::new(respuesta_nodo.data.as_slice()))
                .map(|stats| stats.size)
                .unwrap_or(0);
        let registro = RegistroCheckpoint {
            tag: tag.to_string(),
            creador: pedido.username.clone(),
            creado_en: chrono::Local::now().timestamp(),
            tamanio,
        };
        self.registry.modificar(&ficha.nombre, |f| {
            f.checkpoints.insert(tag.to_string(), registro);
        });
        self.logger.info(
            &format!("checkpoint '{tag}' de '{}' creado", ficha.nombre),
            "CHECKPOINTS",
        );
        pedido.responder(
            CodigoResultado::Success,
            &format!("Checkpoint '{tag}' de '{}' creado", ficha.nombre),
        )
    }

    /// VIEWCHECKPOINT: muestra el contenido materializado de un checkpoint
    /// registrado.
    pub(crate) fn op_view_checkpoint(&self, pedido: &Trama) -> Trama {
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
        let tag = pedido.checkpoint_tag.trim();
        if !ficha.checkpoints.contains_key(tag) {
            return pedido.responder(
                CodigoResultado::CheckpointNotFound,
                &format!("No hay un checkpoint '{tag}' de '{}'", ficha.nombre),
            );
        }
        let nodo = match self.nodo_disponible_de(&ficha) {
            Some(nodo) => nodo,
            None => return self.sin_nodo(pedido, &ficha),
        };

        let control = Trama::nueva(Opcode::ViewCheckpoint, &pedido.username)
            .con_archivo(&ficha.nombre)
            .con_tag(tag);
        match self.pedir_o_unavailable(&nodo, &control, pedido) {
            Ok(respuesta_nodo) => match respuesta_nodo.resultado() {
                Some(codigo) if codigo.es_exito() => {
                    pedido.responder(CodigoResultado::Data, &respuesta_nodo.data_texto())
                }
                Some(codigo) => pedido.responder(codigo, &respuesta_nodo.data_texto()),
                None => pedido.responder(
                    CodigoResultado::ServerError,
                    "Respuesta invalida del nodo",
                ),
            },
            Err(unavailable) => unavailable,
        }
    }

    /// REVERT: pisa el contenido vivo con el de un checkpoint registrado.
    pub(crate) fn op_revert(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if !ficha.puede_escribir(&pedido.username) {
            return pedido.responder(
                CodigoResultado::Denied,
                "Hace falta permiso de escritura para revertir",
            );
        }
        let tag = pedido.checkpoint_tag.trim();
        if !ficha.checkpoints.contains_key(tag) {
            return pedido.responder(
                CodigoResultado::CheckpointNotFound,
                &format!("No hay un checkpoint '{tag}' de '{}'", ficha.nombre),
            );
        }
        let nodo = match self.nodo_disponible_de(&ficha) {
            Some(nodo) => nodo,
            None => return self.sin_nodo(pedido, &ficha),
        };

        let control = Trama::nueva(Opcode::Revert, &pedido.username)
            .con_archivo(&ficha.nombre)
            .con_tag(tag);
        let respuesta_nodo = match self.pedir_o_unavailable(&nodo, &control, pedido) {
            Ok(respuesta) => respuesta,
            Err(unavailable) => return unavailable,
        };
        if let Some(codigo) = respuesta_nodo.resultado() {
            if !codigo.es_exito() {
                return pedido.responder(codigo, &respuesta_nodo.data_texto());
            }
        }

        self.registry.modificar(&ficha.nombre, |f| {
            f.modificado_en = chrono::Local::now().timestamp();
        });
        pedido.responder(
            CodigoResultado::Success,
            &format!("Archivo '{}' revertido al checkpoint '{tag}'", ficha.nombre),
        )
    }

    /// LISTCHECKPOINTS: lista el indice de checkpoints de un archivo.
    pub(crate) fn op_list_checkpoints(&self, pedido: &Trama) -> Trama {
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

        let mut registros: Vec<&RegistroCheckpoint> = ficha.checkpoints.values().collect();
        registros.sort_by(|a, b| a.creado_en.cmp(&b.creado_en).then(a.tag.cmp(&b.tag)));
        if registros.is_empty() {
            return pedido.responder(
                CodigoResultado::Success,
                &format!("'{}' no tiene checkpoints", ficha.nombre),
            );
        }

        let lineas: Vec<String> = registros
            .iter()
            .map(|r| {
                format!(
                    "{} por {} el {} ({} bytes)",
                    r.tag,
                    r.creador,
                    formatear_fecha(r.creado_en),
                    r.tamanio
                )
            })
            .collect();
        pedido.responder(CodigoResultado::Success, &lineas.join("\n"))
    }
}
