mod common;

use common::{add_card, column_layout, positions_are_dense, seeded_service, DOING, TODO};
use kanban_core::{open_db, BoardService, CreateCardRequest, SqliteBoardStore};
use std::sync::Barrier;

const WRITERS: usize = 2;
const CARDS_PER_WRITER: usize = 10;
const MOVE_ROUNDS: usize = 6;

#[test]
fn concurrent_appends_from_separate_connections_never_share_a_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    {
        let conn = open_db(&path).unwrap();
        seeded_service(&conn);
    }

    let barrier = Barrier::new(WRITERS);
    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let path = &path;
            let barrier = &barrier;
            scope.spawn(move || {
                let conn = open_db(path).unwrap();
                let service = BoardService::new(SqliteBoardStore::try_new(&conn).unwrap());
                service.ensure_seed().unwrap();
                barrier.wait();
                for index in 0..CARDS_PER_WRITER {
                    service
                        .create_card(&CreateCardRequest {
                            column_id: DOING,
                            title: format!("writer {writer} card {index}"),
                            ..CreateCardRequest::default()
                        })
                        .unwrap();
                }
            });
        }
    });

    let conn = open_db(&path).unwrap();
    let service = seeded_service(&conn);
    let layout = column_layout(&service, DOING);
    assert_eq!(layout.len(), WRITERS * CARDS_PER_WRITER);
    assert!(positions_are_dense(&layout));
}

#[test]
fn concurrent_moves_between_shared_columns_keep_both_dense() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    let owned: Vec<Vec<i64>> = {
        let conn = open_db(&path).unwrap();
        let service = seeded_service(&conn);
        (0..WRITERS)
            .map(|writer| {
                (0..CARDS_PER_WRITER)
                    .map(|index| add_card(&service, TODO, &format!("w{writer}-{index}")).id)
                    .collect()
            })
            .collect()
    };

    let barrier = Barrier::new(WRITERS);
    std::thread::scope(|scope| {
        for card_ids in &owned {
            let path = &path;
            let barrier = &barrier;
            scope.spawn(move || {
                let conn = open_db(path).unwrap();
                let service = BoardService::new(SqliteBoardStore::try_new(&conn).unwrap());
                barrier.wait();
                for round in 0..MOVE_ROUNDS {
                    let target = if round % 2 == 0 { DOING } else { TODO };
                    for card_id in card_ids {
                        let moved = service.move_card(*card_id, target, 0).unwrap();
                        assert_eq!(moved.to_column_id, target);
                        assert_eq!(moved.position, 0);
                    }
                }
            });
        }
    });

    let conn = open_db(&path).unwrap();
    let service = seeded_service(&conn);
    let todo = column_layout(&service, TODO);
    let doing = column_layout(&service, DOING);
    assert!(positions_are_dense(&todo));
    assert!(positions_are_dense(&doing));

    let mut seen: Vec<i64> = todo.iter().chain(doing.iter()).map(|(id, _)| *id).collect();
    seen.sort_unstable();
    let mut expected: Vec<i64> = owned.into_iter().flatten().collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);
}

#[test]
fn concurrent_seeding_creates_one_board() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    open_db(&path).unwrap();

    let barrier = Barrier::new(WRITERS);
    let boards: Vec<i64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|_| {
                let path = &path;
                let barrier = &barrier;
                scope.spawn(move || {
                    let conn = open_db(path).unwrap();
                    let service = BoardService::new(SqliteBoardStore::try_new(&conn).unwrap());
                    barrier.wait();
                    service.ensure_seed().unwrap().id
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert!(boards.windows(2).all(|pair| pair[0] == pair[1]));
    let conn = open_db(&path).unwrap();
    assert_eq!(common::count_rows(&conn, "boards"), 1);
    assert_eq!(common::count_rows(&conn, "columns"), 3);
}
