use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    routes::{default_route, search_route},
    services::SearchService,
};

pub fn run(
    listener: TcpListener,
    search_service: SearchService,
) -> Result<Server, std::io::Error> {
    let search_service = web::Data::new(search_service);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(
                web::scope("/search")
                    .service(search_route::search)
                    .service(search_route::search_by_query)
                    .service(search_route::search_platform),
            )
            .app_data(search_route::json_config())
            .app_data(search_route::query_config())
            .app_data(search_service.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
