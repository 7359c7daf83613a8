//! Este modulo contiene las operaciones de carpetas: alta con ancestros,
//! listado por carpeta y movimiento de archivos
use crate::coordinator::Coordinator;
use crate::registro::carpetas::ruta_valida;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::opcode::Opcode;
use docfs_client::protocol::trama::Trama;

impl Coordinator {
    /// CREATEFOLDER: alta de una carpeta logica, creando los ancestros
    /// faltantes con el mismo duenio.
    pub(crate) fn op_create_folder(&self, pedido: &Trama) -> Trama {
        let ruta = pedido.folder.trim();
        if !ruta_valida(ruta) {
            return pedido.responder(CodigoResultado::BadRequest, "Ruta de carpeta invalida");
        }
        match self.carpetas.crear(ruta, &pedido.username) {
            Ok(creadas) => {
                self.logger.info(
                    &format!("carpeta '{ruta}' creada por '{}'", pedido.username),
                    "CARPETAS",
                );
                pedido.responder(
                    CodigoResultado::Success,
                    &format!("Carpeta '{ruta}' creada ({creadas} nueva(s))"),
                )
            }
            Err(_) => pedido.responder(
                CodigoResultado::FolderExists,
                &format!("La carpeta '{ruta}' ya existe"),
            ),
        }
    }

    /// VIEWFOLDER: lista los archivos cuya carpeta coincide; la ruta vacia
    /// es la raiz.
    pub(crate) fn op_view_folder(&self, pedido: &Trama) -> Trama {
        let ruta = pedido.folder.trim();
        if !ruta.is_empty() && !ruta_valida(ruta) {
            return pedido.responder(CodigoResultado::BadRequest, "Ruta de carpeta invalida");
        }
        if !self.carpetas.existe(ruta) {
            return pedido.responder(
                CodigoResultado::FolderMissing,
                &format!("La carpeta '{ruta}' no existe"),
            );
        }

        let lineas: Vec<String> = self
            .registry
            .listar()
            .into_iter()
            .filter(|ficha| ficha.carpeta == ruta)
            .map(|ficha| {
                format!("[{}] {}", ficha.marcador_acceso(&pedido.username), ficha.nombre)
            })
            .collect();

        if lineas.is_empty() {
            return pedido.responder(CodigoResultado::Success, "Carpeta vacia");
        }
        pedido.responder(CodigoResultado::Success, &lineas.join("\n"))
    }

    /// MOVE: cambia la carpeta logica de un archivo y ordena al nodo la
    /// recolocacion fisica; requiere permiso de escritura.
    pub(crate) fn op_move(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if !ficha.puede_escribir(&pedido.username) {
            return pedido.responder(
                CodigoResultado::Denied,
                &format!("'{}' no puede mover '{}'", pedido.username, ficha.nombre),
            );
        }

        let destino = pedido.folder.trim();
        if !destino.is_empty() {
            if !ruta_valida(destino) {
                return pedido.responder(CodigoResultado::BadRequest, "Ruta de carpeta invalida");
            }
            if !self.carpetas.existe(destino) {
                return pedido.responder(
                    CodigoResultado::FolderMissing,
                    &format!("La carpeta '{destino}' no existe"),
                );
            }
        }

        let nodo = match self.nodo_disponible_de(&ficha) {
            Some(nodo) => nodo,
            None => return self.sin_nodo(pedido, &ficha),
        };
        let control = Trama::nueva(Opcode::Move, &pedido.username)
            .con_archivo(&ficha.nombre)
            .con_carpeta(destino);
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
            f.carpeta = destino.to_string();
            f.modificado_en = chrono::Local::now().timestamp();
        });
        let destino_legible = if destino.is_empty() { "(raiz)" } else { destino };
        pedido.responder(
            CodigoResultado::Success,
            &format!("Archivo '{}' movido a {destino_legible}", ficha.nombre),
        )
    }
}
