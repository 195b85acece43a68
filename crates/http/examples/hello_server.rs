//! A small demo server exercising buffered and chunked responses.
//!
//! Run with `cargo run --example hello_server`, then try:
//!
//! ```text
//! curl -v http://127.0.0.1:42069/
//! curl -v http://127.0.0.1:42069/yourproblem
//! curl -v --raw http://127.0.0.1:42069/countdown
//! ```

use http1_wire::connection::ResponseWriter;
use http1_wire::handler::make_handler;
use http1_wire::protocol::{HeaderMap, Request, SendError, StatusCode, default_headers};
use http1_wire::server::Server;
use indoc::indoc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

const PORT: u16 = 42069;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let server = Server::serve(("127.0.0.1", PORT), make_handler(route)).await?;
    info!(port = PORT, "server started");

    tokio::signal::ctrl_c().await?;
    server.close().await;
    info!("server gracefully stopped");
    Ok(())
}

async fn route(mut writer: ResponseWriter, request: Request) -> Result<(), SendError> {
    match request.target() {
        "/yourproblem" => {
            let body = indoc! {r#"
                <html>
                  <head>
                    <title>400 Bad Request</title>
                  </head>
                  <body>
                    <h1>Bad Request</h1>
                    <p>Your request honestly kinda sucked.</p>
                  </body>
                </html>
            "#};
            html(&mut writer, StatusCode::BAD_REQUEST, body).await
        }

        "/myproblem" => {
            let body = indoc! {r#"
                <html>
                  <head>
                    <title>500 Internal Server Error</title>
                  </head>
                  <body>
                    <h1>Internal Server Error</h1>
                    <p>Okay, you know what? This one is on me.</p>
                  </body>
                </html>
            "#};
            html(&mut writer, StatusCode::INTERNAL_SERVER_ERROR, body).await
        }

        "/countdown" => {
            let mut headers = HeaderMap::new();
            headers.set("Transfer-Encoding", "chunked");
            headers.set("Content-Type", "text/plain");
            headers.set("Connection", "close");
            headers.set("Trailer", "X-Chunk-Count");

            writer.start_stream(StatusCode::OK, headers).await?;
            let mut chunks = 0;
            for n in (1..=5).rev() {
                writer.write_chunk(format!("{n}...\n").as_bytes()).await?;
                chunks += 1;
            }
            writer.write_chunk(b"liftoff!\n").await?;
            chunks += 1;
            writer.end_stream().await?;

            let mut trailers = HeaderMap::new();
            trailers.set("X-Chunk-Count", &chunks.to_string());
            writer.write_trailers(trailers).await
        }

        _ => {
            let body = indoc! {r#"
                <html>
                  <head>
                    <title>200 OK</title>
                  </head>
                  <body>
                    <h1>Success!</h1>
                    <p>Your request was an absolute banger.</p>
                  </body>
                </html>
            "#};
            html(&mut writer, StatusCode::OK, body).await
        }
    }
}

async fn html(writer: &mut ResponseWriter, status: StatusCode, body: &str) -> Result<(), SendError> {
    let mut headers = default_headers(0);
    headers.set("Content-Type", "text/html");
    writer.write(status, headers, body.as_bytes()).await
}
