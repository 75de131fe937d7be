use crate::admin::{AdminCommand, RoomDescription, RoomSummary};
use crate::server::{ServerCommand, ServerTx};
use actix_web::error;
use actix_web::{web, HttpResponse, Result};
use system::RoomId;
use tokio::sync::oneshot;

pub fn configure_admin_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(
                web::resource("/rooms")
                    .name("admin_rooms")
                    .route(web::get().to(list_rooms)),
            )
            .service(
                web::resource("/rooms/{room_id:.*}")
                    .name("admin_room")
                    .route(web::get().to(show_room)),
            ),
    );
}

fn ask_relay(srv_tx: &ServerTx, command: AdminCommand) -> Result<()> {
    srv_tx
        .send(ServerCommand::Admin(command))
        .map_err(|_| error::ErrorInternalServerError("Internal Server Error"))
}

pub async fn list_rooms(srv_tx: web::Data<ServerTx>) -> Result<HttpResponse> {
    let (tx, rx) = oneshot::channel::<Vec<RoomSummary>>();
    ask_relay(srv_tx.get_ref(), AdminCommand::ListRooms { tx })?;

    let rooms = rx
        .await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))?;
    Ok(HttpResponse::Ok().json(rooms))
}

pub async fn show_room(
    path: web::Path<String>,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse> {
    let room_id = path
        .into_inner()
        .parse::<RoomId>()
        .map_err(|_| error::ErrorBadRequest("invalid format"))?;

    let (tx, rx) = oneshot::channel::<Option<RoomDescription>>();
    ask_relay(srv_tx.get_ref(), AdminCommand::DescribeRoom { room_id, tx })?;

    let description = rx
        .await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))?
        .ok_or_else(|| error::ErrorNotFound("no such room"))?;
    Ok(HttpResponse::Ok().json(description))
}
