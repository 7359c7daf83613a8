//! Este modulo contiene las operaciones de control de acceso: altas y
//! bajas de ACL por el duenio y el circuito de solicitudes de acceso
use crate::comandos::utils::formatear_fecha;
use crate::coordinator::Coordinator;
use crate::registro::archivo::EntradaAcl;
use crate::registro::solicitudes::ErrorSolicitud;
use docfs_client::protocol::codigo_resultado::CodigoResultado;
use docfs_client::protocol::constantes::{ACCESO_ESCRITURA, ACCESO_LECTURA};
use docfs_client::protocol::trama::Trama;

/// Describe una mascara de acceso para los mensajes legibles; la
/// escritura implica siempre la lectura.
fn describir_mascara(mascara: i32) -> &'static str {
    if mascara & ACCESO_ESCRITURA != 0 {
        "lectura y escritura"
    } else if mascara & ACCESO_LECTURA != 0 {
        "lectura"
    } else {
        "ninguno"
    }
}

impl Coordinator {
    /// ADDACCESS: el duenio otorga o promueve el acceso de un usuario
    /// registrado; escritura implica lectura.
    pub(crate) fn op_add_access(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if pedido.username != ficha.duenio {
            return pedido.responder(
                CodigoResultado::Denied,
                "Solo el duenio puede otorgar accesos",
            );
        }

        let objetivo = pedido.data_texto().trim().to_string();
        if objetivo.is_empty() {
            return pedido.responder(CodigoResultado::BadRequest, "Falta el usuario objetivo");
        }
        if objetivo == ficha.duenio {
            return pedido.responder(
                CodigoResultado::BadRequest,
                "El duenio ya tiene todos los permisos",
            );
        }
        if !self.usuarios.existe(&objetivo) {
            return pedido.responder(
                CodigoResultado::NotFound,
                &format!("El usuario '{objetivo}' no esta registrado"),
            );
        }
        let mascara = pedido.flags & (ACCESO_LECTURA | ACCESO_ESCRITURA);
        if mascara == 0 {
            return pedido.responder(CodigoResultado::BadRequest, "Mascara de acceso invalida");
        }

        self.registry.modificar(&ficha.nombre, |f| {
            f.otorgar(&objetivo, EntradaAcl::desde_mascara(mascara));
        });
        self.logger.info(
            &format!(
                "acceso de {} sobre '{}' otorgado a '{objetivo}'",
                describir_mascara(mascara),
                ficha.nombre
            ),
            "ACCESOS",
        );
        pedido.responder(
            CodigoResultado::Success,
            &format!(
                "Acceso de {} sobre '{}' otorgado a '{objetivo}'",
                describir_mascara(mascara),
                ficha.nombre
            ),
        )
    }

    /// REMACCESS: el duenio revoca la entrada de un usuario; a si mismo
    /// no puede.
    pub(crate) fn op_rem_access(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if pedido.username != ficha.duenio {
            return pedido.responder(
                CodigoResultado::Denied,
                "Solo el duenio puede revocar accesos",
            );
        }
        let objetivo = pedido.data_texto().trim().to_string();
        if objetivo == ficha.duenio {
            return pedido.responder(
                CodigoResultado::Denied,
                "El duenio no puede revocarse a si mismo",
            );
        }

        let revocado = self
            .registry
            .modificar(&ficha.nombre, |f| f.revocar(&objetivo))
            .unwrap_or(false);
        if !revocado {
            return pedido.responder(
                CodigoResultado::NotFound,
                &format!("'{objetivo}' no tiene acceso otorgado sobre '{}'", ficha.nombre),
            );
        }
        pedido.responder(
            CodigoResultado::Success,
            &format!("Acceso de '{objetivo}' sobre '{}' revocado", ficha.nombre),
        )
    }

    /// REQUESTACCESS: cualquier usuario pide acceso a un archivo ajeno;
    /// a lo sumo una solicitud pendiente por par (usuario, archivo).
    pub(crate) fn op_request_access(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if pedido.username == ficha.duenio {
            return pedido.responder(
                CodigoResultado::BadRequest,
                "El duenio no necesita solicitar acceso",
            );
        }
        let mascara = pedido.flags & (ACCESO_LECTURA | ACCESO_ESCRITURA);
        if mascara == 0 {
            return pedido.responder(CodigoResultado::BadRequest, "Mascara de acceso invalida");
        }

        match self.solicitudes.crear(&pedido.username, &ficha.nombre, mascara) {
            Ok(id) => {
                let mut respuesta = pedido.responder(
                    CodigoResultado::Success,
                    &format!(
                        "Solicitud #{id} de {} sobre '{}' registrada",
                        describir_mascara(mascara),
                        ficha.nombre
                    ),
                );
                respuesta.request_id = id;
                respuesta
            }
            Err(existente) => pedido.responder(
                CodigoResultado::Exists,
                &format!("Ya hay una solicitud pendiente (#{existente}) sobre '{}'", ficha.nombre),
            ),
        }
    }

    /// VIEWREQUESTS: el duenio lista las solicitudes pendientes.
    pub(crate) fn op_view_requests(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if pedido.username != ficha.duenio {
            return pedido.responder(
                CodigoResultado::Denied,
                "Solo el duenio puede ver las solicitudes",
            );
        }

        let pendientes = self.solicitudes.pendientes_de(&ficha.nombre);
        if pendientes.is_empty() {
            return pedido.responder(
                CodigoResultado::NoRequests,
                &format!("No hay solicitudes pendientes sobre '{}'", ficha.nombre),
            );
        }

        let lineas: Vec<String> = pendientes
            .iter()
            .map(|s| {
                format!(
                    "#{} {} pide {} desde {}",
                    s.id,
                    s.solicitante,
                    describir_mascara(s.mascara),
                    formatear_fecha(s.pedida_en)
                )
            })
            .collect();
        pedido.responder(CodigoResultado::Success, &lineas.join("\n"))
    }

    /// APPROVE/DENY: el duenio resuelve una solicitud; aprobar actualiza
    /// la ACL con la mascara pedida.
    pub(crate) fn op_respond_request(&self, pedido: &Trama) -> Trama {
        let ficha = match self.ficha_o_not_found(pedido) {
            Ok(ficha) => ficha,
            Err(respuesta) => return respuesta,
        };
        if pedido.username != ficha.duenio {
            return pedido.responder(
                CodigoResultado::Denied,
                "Solo el duenio puede responder solicitudes",
            );
        }

        let aprobar = pedido.flags != 0;
        let solicitud = match self.solicitudes.responder(&ficha.nombre, pedido.request_id, aprobar)
        {
            Ok(solicitud) => solicitud,
            Err(ErrorSolicitud::NoEncontrada) | Err(ErrorSolicitud::YaRespondida) => {
                return pedido.responder(
                    CodigoResultado::RequestNotFound,
                    &format!(
                        "No hay una solicitud pendiente #{} sobre '{}'",
                        pedido.request_id, ficha.nombre
                    ),
                );
            }
        };

        if aprobar {
            self.registry.modificar(&ficha.nombre, |f| {
                f.otorgar(&solicitud.solicitante, EntradaAcl::desde_mascara(solicitud.mascara));
            });
            self.logger.info(
                &format!(
                    "solicitud #{} de '{}' sobre '{}' aprobada",
                    solicitud.id, solicitud.solicitante, ficha.nombre
                ),
                "ACCESOS",
            );
            return pedido.responder(
                CodigoResultado::Success,
                &format!(
                    "Solicitud #{} aprobada: '{}' obtuvo {}",
                    solicitud.id,
                    solicitud.solicitante,
                    describir_mascara(solicitud.mascara)
                ),
            );
        }
        pedido.responder(
            CodigoResultado::Success,
            &format!("Solicitud #{} denegada", solicitud.id),
        )
    }
}
