//! HTTP server for the site

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::about::SkillTicker;
use crate::content::ContentError;
use crate::pages::{PageError, Site};
use crate::Folio;

/// Server state
pub struct ServerState {
    site: Site,
    static_dir: PathBuf,
}

impl ServerState {
    pub fn new(site: Site, static_dir: PathBuf) -> Self {
        Self { site, static_dir }
    }
}

/// Build the router over shared state
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/writings/:slug", get(writing_handler))
        .route("/about", get(about_handler))
        .route("/about/skills", get(skills_handler))
        .route("/uses", get(uses_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(folio: &Folio, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let site = Site::new(folio)?;
    let state = Arc::new(ServerState::new(site, folio.static_dir.clone()));
    let app = router(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Watching {} for changes...", folio.writings_dir.display());
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let writings_dir = folio.writings_dir.clone();
        let state = state.clone();

        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_writings(writings_dir, state) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch the writings directory and re-index the store on change
fn watch_writings(writings_dir: PathBuf, state: Arc<ServerState>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid re-indexes
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    debouncer
        .watcher()
        .watch(&writings_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching: {:?}", writings_dir);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|e| {
                    e.path
                        .extension()
                        .map(|ext| ext == "md")
                        .unwrap_or(false)
                });
                if !relevant {
                    continue;
                }

                for event in &events {
                    tracing::info!("File changed: {}", event.path.display());
                }
                state.site.store().refresh();
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.site.index_page().await {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(&state.site, e),
    }
}

async fn writing_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    match state.site.writing_page(&slug).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(&state.site, e),
    }
}

async fn about_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.site.about_page(true) {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(&state.site, e),
    }
}

async fn uses_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.site.uses_page() {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(&state.site, e),
    }
}

/// WebSocket handler for the about page skill rotation
async fn skills_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let about = &state.site.config().about;
    let skills = about.skills.clone();
    let period = Duration::from_secs(about.rotate_interval_secs);
    ws.on_upgrade(move |socket| handle_skills_socket(socket, skills, period))
}

/// Push the next skill on every tick until the page goes away
async fn handle_skills_socket(socket: WebSocket, skills: Vec<String>, period: Duration) {
    let (mut sender, mut receiver) = socket.split();
    feed_skills(&mut sender, &mut receiver, skills, period).await;
}

/// Rotation loop over the two halves of a connection
///
/// The ticker is owned by this loop and dropped when the client goes away.
/// With fewer than two skills there is nothing to rotate and the sink is
/// closed straight away.
async fn feed_skills<Tx, Rx, E>(
    sender: &mut Tx,
    receiver: &mut Rx,
    skills: Vec<String>,
    period: Duration,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
{
    if skills.len() < 2 {
        let _ = sender.close().await;
        return;
    }

    tracing::debug!("Skill rotation client connected");
    let mut ticker = SkillTicker::start(skills, period);

    loop {
        tokio::select! {
            skill = ticker.tick() => {
                let Some(skill) = skill.map(str::to_string) else {
                    continue;
                };
                if sender.send(Message::Text(skill)).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Skill rotation client disconnected");
}

/// Fallback handler that serves static files, then the not-found page
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => not_found(&state.site),
        Err(e) => {
            tracing::error!("Static file error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

fn not_found(site: &Site) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(site.error_page(404, "This page could not be found.")),
    )
        .into_response()
}

/// Map a page error onto a response
///
/// Bad and unknown slugs are answered as not found; a writing that exists
/// but cannot be displayed is a server error.
fn error_response(site: &Site, err: PageError) -> Response {
    if err.is_not_found() {
        tracing::debug!("Not found: {}", err);
        return not_found(site);
    }

    let message = match &err {
        PageError::Content(ContentError::MalformedFrontMatter(_)) => {
            "This writing could not be displayed."
        }
        _ => "Something went wrong while rendering this page.",
    };
    tracing::error!("{}", err);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(site.error_page(500, message)),
    )
        .into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use futures::channel::mpsc;
    use std::convert::Infallible;
    use tower::ServiceExt;

    const DOC: &str = "---\ntitle: Hello\nauthor:\n  name: T\n  twitter: t\n---\n# Hi\n\n[home](/)\n";

    fn create_test_router() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let writings = dir.path().join("writings");
        let static_dir = dir.path().join("static");
        fs::create_dir_all(&writings).unwrap();
        fs::create_dir_all(&static_dir).unwrap();
        fs::write(writings.join("hello.md"), DOC).unwrap();
        fs::write(writings.join("broken.md"), "no front matter\n").unwrap();
        fs::write(dir.path().join("secret.md"), DOC).unwrap();
        fs::write(static_dir.join("base.css"), "body { margin: 0; }").unwrap();

        let folio = Folio::new(dir.path()).unwrap();
        let site = Site::new(&folio).unwrap();
        let state = Arc::new(ServerState::new(site, folio.static_dir.clone()));
        (dir, router(state))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    #[tokio::test]
    async fn test_writing_route() {
        let (_dir, app) = create_test_router();
        let (status, body) = get(app, "/writings/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Hi</h1>"));
        assert!(body.contains("<p>/</p>"));
    }

    #[tokio::test]
    async fn test_missing_writing_is_not_found() {
        let (_dir, app) = create_test_router();
        let (status, body) = get(app, "/writings/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<h1>404</h1>"));
    }

    #[tokio::test]
    async fn test_traversal_slug_is_not_found() {
        let (_dir, app) = create_test_router();
        let (status, body) = get(app, "/writings/..%2Fsecret").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("<h1>Hi</h1>"));
    }

    #[tokio::test]
    async fn test_malformed_writing_is_server_error() {
        let (_dir, app) = create_test_router();
        let (status, body) = get(app, "/writings/broken").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("could not be displayed"));
    }

    #[tokio::test]
    async fn test_site_pages() {
        let (_dir, app) = create_test_router();
        let (status, body) = get(app.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/writings/hello"));
        assert!(!body.contains("/writings/broken"));

        let (status, body) = get(app.clone(), "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/about/skills"));

        let (status, _) = get(app, "/uses").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_files_and_unknown_paths() {
        let (_dir, app) = create_test_router();
        let (status, body) = get(app.clone(), "/base.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body { margin: 0; }");

        let (status, body) = get(app, "/does/not/exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("could not be found"));
    }

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_skill_feed_pushes_each_period_until_close() {
        let (mut out_tx, mut out_rx) = mpsc::unbounded::<Message>();
        let (in_tx, mut in_rx) = mpsc::unbounded::<Result<Message, Infallible>>();
        let start = tokio::time::Instant::now();

        let feed = tokio::spawn(async move {
            feed_skills(
                &mut out_tx,
                &mut in_rx,
                skills(&["one", "two", "three"]),
                Duration::from_secs(3),
            )
            .await;
        });

        assert_eq!(out_rx.next().await, Some(Message::Text("two".to_string())));
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(6));

        assert_eq!(
            out_rx.next().await,
            Some(Message::Text("three".to_string()))
        );
        assert!(start.elapsed() >= Duration::from_secs(6));

        in_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        feed.await.unwrap();

        // The loop owned the sender; nothing more can arrive
        assert_eq!(out_rx.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skill_feed_answers_ping() {
        let (mut out_tx, mut out_rx) = mpsc::unbounded::<Message>();
        let (in_tx, mut in_rx) = mpsc::unbounded::<Result<Message, Infallible>>();

        let feed = tokio::spawn(async move {
            feed_skills(
                &mut out_tx,
                &mut in_rx,
                skills(&["one", "two"]),
                Duration::from_secs(3),
            )
            .await;
        });

        in_tx.unbounded_send(Ok(Message::Ping(vec![1, 2]))).unwrap();
        assert_eq!(out_rx.next().await, Some(Message::Pong(vec![1, 2])));

        drop(in_tx);
        feed.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_skill_feed_closes_without_rotation() {
        for names in [&[][..], &["only"][..]] {
            let (mut out_tx, mut out_rx) = mpsc::unbounded::<Message>();
            let (_in_tx, mut in_rx) = mpsc::unbounded::<Result<Message, Infallible>>();

            feed_skills(
                &mut out_tx,
                &mut in_rx,
                skills(names),
                Duration::from_secs(3),
            )
            .await;

            assert_eq!(out_rx.next().await, None);
        }
    }
}
