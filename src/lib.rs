use tracing_subscriber::prelude::*;
use tracing_web::MakeConsoleWriter;
use worker::*;

mod config;
mod error;
mod handlers;
mod pipeline;
mod publish;
mod scraper;
mod templates;
mod utils;

#[event(start)]
fn start() {
    console_error_panic_hook::set_once();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeConsoleWriter);
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

#[event(fetch)]
async fn fetch(mut req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    // Strip trailing slash (except root) and redirect-internally by rewriting
    let url = req.url()?;
    let path = url.path().to_string();

    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let mut new_url = url.clone();
        new_url.set_path(trimmed);

        let mut init = RequestInit::new();
        init.with_method(req.method()).with_headers(req.headers().clone());
        if req.method() == Method::Post {
            init.with_body(Some(req.text().await?.into()));
        }

        let new_req = Request::new_with_init(new_url.as_str(), &init)?;
        return build_router().run(new_req, env).await;
    }

    build_router().run(req, env).await
}

fn build_router() -> Router<'static, ()> {
    Router::new()
        .get("/", handlers::home::handle)
        .get_async("/extract", handlers::extract::handle)
        .get_async("/extract/:postID", handlers::extract::handle)
        .get_async("/p/:postID", handlers::extract::handle)
        .get_async("/reel/:postID", handlers::extract::handle)
        .get_async("/reels/:postID", handlers::extract::handle)
        .get_async("/tv/:postID", handlers::extract::handle)
        .get_async("/:username/p/:postID", handlers::extract::handle)
        .get_async("/:username/reel/:postID", handlers::extract::handle)
        .get_async("/videos/:postID", handlers::media::videos)
        .post_async("/batch", handlers::batch::handle)
}
