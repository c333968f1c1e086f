use crate::{
    api::{leave, leave_type},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .wrap(build_limiter(config.rate_mutate_per_min))
                            .route(web::post().to(leave::submit_leave)),
                    )
                    // /leave/today
                    .service(
                        web::resource("/today").route(web::get().to(leave::on_leave_today)),
                    )
                    // /leave/team
                    .service(web::resource("/team").route(web::get().to(leave::team_leave)))
                    // /leave/carry-forward
                    .service(
                        web::resource("/carry-forward")
                            .wrap(build_limiter(config.rate_mutate_per_min))
                            .route(web::post().to(leave::run_carry_forward)),
                    )
                    // /leave/balance/{user_id}
                    .service(
                        web::resource("/balance/{user_id}")
                            .wrap(build_limiter(config.rate_read_per_min))
                            .route(web::get().to(leave::get_balance)),
                    )
                    // /leave/history/{user_id}
                    .service(
                        web::resource("/history/{user_id}")
                            .route(web::get().to(leave::get_history)),
                    )
                    // /leave/incoming/{approver_id}
                    .service(
                        web::resource("/incoming/{approver_id}")
                            .route(web::get().to(leave::incoming_requests)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .wrap(build_limiter(config.rate_mutate_per_min))
                            .route(web::put().to(leave::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .wrap(build_limiter(config.rate_mutate_per_min))
                            .route(web::put().to(leave::reject_leave)),
                    )
                    // /leave/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .wrap(build_limiter(config.rate_mutate_per_min))
                            .route(web::put().to(leave::cancel_leave)),
                    ),
            )
            .service(
                web::scope("/leave-type")
                    // /leave-type
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_type::list_leave_types))
                            .route(web::post().to(leave_type::create_leave_type)),
                    )
                    // /leave-type/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(leave_type::update_leave_type))
                            .route(web::delete().to(leave_type::delete_leave_type)),
                    ),
            ),
    );
}
