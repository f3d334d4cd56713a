//! Remote board source.
//! Two read-only GET endpoints: `/current_board` and `/get_valid_moves`.
//! `BoardSource` is the seam between the view and the network so tests can
//! substitute an in-memory source.

use crate::board::{Board, Piece, Position, validate_moves};
use crate::view::{Event, FetchRequest, Retrieval};
use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::debug;

/// Address of the board server when `--server` is not given.
pub const DEFAULT_SERVER: &str = "http://195.35.22.177:4545";

pub trait BoardSource {
    /// Full board, validated.
    fn current_board(&self) -> impl Future<Output = Result<Board>> + Send;

    /// Destination squares for the piece standing on `at`.
    fn valid_moves(&self, at: Position) -> impl Future<Output = Result<Vec<Position>>> + Send;
}

/// `BoardSource` over HTTP. No timeout and no retry: a failure is reported once.
pub struct HttpSource {
    client: Client,
    base: String,
}

impl HttpSource {
    pub fn new(server: &str) -> Result<Self> {
        let client = Client::builder().build().context("Failed to create HTTP client")?;
        Ok(HttpSource { client, base: server.trim_end_matches('/').to_string() })
    }

    pub fn server(&self) -> &str {
        &self.base
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, u8)]) -> Result<T> {
        let url = format!("{}{}", self.base, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("{} returned {}: {}", url, status, body);
        }

        let body = response.text().await.with_context(|| format!("Failed to read body from {}", url))?;
        serde_json::from_str(&body).with_context(|| format!("{} did not return the expected JSON", url))
    }
}

impl BoardSource for HttpSource {
    async fn current_board(&self) -> Result<Board> {
        let pieces: Vec<Piece> = self.get_json("/current_board", &[]).await?;
        Board::from_pieces(pieces).context("Server sent an invalid board")
    }

    async fn valid_moves(&self, at: Position) -> Result<Vec<Position>> {
        self.get_json("/get_valid_moves", &[("row", at.row()), ("col", at.col())])
            .await
    }
}

/// Runs one fetch cycle and reports each outcome through `emit` as it lands.
/// The board comes first; the moves retrieval only runs if the board arrived
/// and the request carries a selection. Moves with off-board targets are
/// reported as a failure.
pub async fn fetch_cycle<S, F>(source: &S, request: FetchRequest, mut emit: F)
where
    S: BoardSource,
    F: FnMut(Event),
{
    let token = request.token;
    debug!(token, selection = ?request.selection, "fetch cycle started");

    match source.current_board().await {
        Ok(board) => emit(Event::BoardArrived { token, board }),
        Err(error) => {
            emit(Event::RetrievalFailed { token, what: Retrieval::Board, error });
            return;
        }
    }

    let Some(at) = request.selection else {
        return;
    };

    match source.valid_moves(at).await.and_then(validate_moves) {
        Ok(moves) => emit(Event::MovesArrived { token, at, moves }),
        Err(error) => emit(Event::RetrievalFailed { token, what: Retrieval::Moves(at), error }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fixtures::starting_board;
    use crate::view::{BoardView, StalePolicy};
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Request {
        Board,
        Moves(Position),
    }

    /// In-memory server that records what was asked of it.
    #[derive(Default)]
    struct MockSource {
        board: Option<Board>,
        moves: HashMap<Position, Vec<Position>>,
        requests: Mutex<Vec<Request>>,
    }

    impl MockSource {
        fn serving(board: Board) -> Self {
            MockSource { board: Some(board), ..Default::default() }
        }

        fn with_moves(mut self, at: Position, moves: Vec<Position>) -> Self {
            self.moves.insert(at, moves);
            self
        }

        fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl BoardSource for MockSource {
        async fn current_board(&self) -> Result<Board> {
            self.requests.lock().unwrap().push(Request::Board);
            self.board.clone().ok_or_else(|| anyhow!("connection refused"))
        }

        async fn valid_moves(&self, at: Position) -> Result<Vec<Position>> {
            self.requests.lock().unwrap().push(Request::Moves(at));
            self.moves.get(&at).cloned().ok_or_else(|| anyhow!("no piece at {}", at))
        }
    }

    async fn run(view: &mut BoardView, source: &MockSource, request: FetchRequest) {
        fetch_cycle(source, request, |event| {
            view.apply(event);
        })
        .await;
    }

    #[tokio::test]
    async fn test_mount_fetches_board_only() {
        let source = MockSource::serving(starting_board());
        let mut view = BoardView::new(StalePolicy::Apply);
        let request = view.start();
        run(&mut view, &source, request).await;

        assert_eq!(source.requests(), vec![Request::Board]);
        assert_eq!(view.board(), Some(&starting_board()));
        assert!(view.valid_moves().is_empty());
    }

    #[tokio::test]
    async fn test_click_fetches_board_then_moves_for_square() {
        let e2 = Position(1, 4);
        let source = MockSource::serving(starting_board())
            .with_moves(e2, vec![Position(2, 4), Position(3, 4)]);
        let mut view = BoardView::new(StalePolicy::Apply);
        let request = view.start();
        run(&mut view, &source, request).await;

        let request = view.apply(Event::CellClicked(e2)).unwrap();
        run(&mut view, &source, request).await;

        assert_eq!(source.requests(), vec![Request::Board, Request::Board, Request::Moves(e2)]);
        assert_eq!(view.valid_moves(), &[Position(2, 4), Position(3, 4)]);
        let flagged = view.cells().iter().filter(|c| c.valid_move).count();
        assert_eq!(flagged, 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_board_skips_moves_and_keeps_state() {
        let loaded = MockSource::serving(starting_board());
        let mut view = BoardView::new(StalePolicy::Apply);
        let request = view.start();
        run(&mut view, &loaded, request).await;

        let down = MockSource::default();
        let mut events = Vec::new();
        let request = view.apply(Event::CellClicked(Position(0, 1))).unwrap();
        fetch_cycle(&down, request, |event| events.push(event)).await;

        assert_eq!(down.requests(), vec![Request::Board]);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::RetrievalFailed { what: Retrieval::Board, .. }));

        for event in events {
            view.apply(event);
        }
        assert_eq!(view.board(), Some(&starting_board()));
        assert!(view.valid_moves().is_empty());
        assert!(logs_contain("Error fetching board"));
        assert!(logs_contain("connection refused"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_off_board_moves_are_a_failed_retrieval() {
        let e2 = Position(1, 4);
        let moves: Vec<Position> = serde_json::from_str("[[9,9],[200,3]]").unwrap();
        let source = MockSource::serving(starting_board()).with_moves(e2, moves);
        let mut view = BoardView::new(StalePolicy::Apply);

        let request = view.apply(Event::CellClicked(e2)).unwrap();
        let mut events = Vec::new();
        fetch_cycle(&source, request, |event| events.push(event)).await;
        assert!(matches!(events[1], Event::RetrievalFailed { what: Retrieval::Moves(at), .. } if at == e2));

        for event in events {
            view.apply(event);
        }
        assert!(view.valid_moves().is_empty());
        assert_eq!(view.cells().iter().filter(|c| c.valid_move).count(), 0);
        assert!(logs_contain("Error fetching valid moves for e2"));
    }

    #[tokio::test]
    async fn test_failed_moves_keeps_previous_moves() {
        let b1 = Position(0, 1);
        let source = MockSource::serving(starting_board()).with_moves(b1, vec![Position(2, 0), Position(2, 2)]);
        let mut view = BoardView::new(StalePolicy::Apply);
        let request = view.apply(Event::CellClicked(b1)).unwrap();
        run(&mut view, &source, request).await;

        // e4 is empty, the mock has nothing for it
        let request = view.apply(Event::CellClicked(Position(3, 4))).unwrap();
        run(&mut view, &source, request).await;

        assert_eq!(view.selection(), Some(Position(3, 4)));
        assert_eq!(view.valid_moves(), &[Position(2, 0), Position(2, 2)]);
    }

    #[test]
    fn test_http_source_trims_trailing_slash() {
        let source = HttpSource::new("http://localhost:4545/").unwrap();
        assert_eq!(source.server(), "http://localhost:4545");
    }

    #[tokio::test]
    #[ignore = "requires the board server"]
    async fn test_real_server_board() {
        // Run with: cargo test test_real_server_board -- --ignored
        let source = HttpSource::new(DEFAULT_SERVER).unwrap();
        let board = source.current_board().await;
        println!("Result: {:?}", board);
        assert!(board.is_ok());
    }
}
