use worker::*;

use crate::templates::home_html::render_home;

pub fn handle(req: Request, _ctx: RouteContext<()>) -> Result<Response> {
    let url = req.url()?;
    let host = url.host_str().unwrap_or("localhost");
    Response::from_html(render_home(host))
}
