//! Integration tests for arena orchestration, driven through the
//! `ArenaManager` the way a host would.

use std::sync::Arc;

use parking_lot::Mutex;
use skirmish_arena::{
    ArenaError, ArenaManager, ArenaSettings, ContextManager, GameOverPolicy,
    Removal, TeleportCause, Winner, World,
};
use skirmish_spawn::{JsonSpawnStore, SpawnStore};
use skirmish_types::{
    ArenaId, ContextKind, LeaveReason, Listener, Location, Notice, Placement,
    PlayerId, Proposal, SpawnKind, Spawnpoint, StartReason, StartRequest, Team,
    Verdict,
};

// =========================================================================
// Helpers
// =========================================================================

/// Records every notice and every start request; can veto joins and
/// leaves.
#[derive(Default)]
struct Recorder {
    notices: Mutex<Vec<Notice>>,
    starts: Mutex<Vec<StartRequest>>,
    deny_joins: Mutex<bool>,
    deny_leaves: Mutex<bool>,
}

impl Listener for Recorder {
    fn review(&self, proposal: &Proposal<'_>) -> Verdict {
        match proposal {
            Proposal::Join { .. } if *self.deny_joins.lock() => Verdict::Deny,
            Proposal::Leave { .. } if *self.deny_leaves.lock() => Verdict::Deny,
            _ => Verdict::Allow,
        }
    }

    fn review_start(&self, request: StartRequest) -> StartRequest {
        self.starts.lock().push(request.clone());
        request
    }

    fn notify(&self, notice: &Notice) {
        self.notices.lock().push(notice.clone());
    }
}

impl Recorder {
    fn count(&self, f: impl Fn(&Notice) -> bool) -> usize {
        self.notices.lock().iter().filter(|n| f(n)).count()
    }
}

/// Sends every lobby join to a fixed location instead of a spawnpoint.
struct Relocate(Location);

impl Listener for Relocate {
    fn place(&self, mut placement: Placement) -> Placement {
        if placement.context == ContextKind::Lobby {
            placement.relocate(self.0.clone());
        }
        placement
    }
}

/// Vetoes every join.
struct DenyJoins;

impl Listener for DenyJoins {
    fn review(&self, proposal: &Proposal<'_>) -> Verdict {
        match proposal {
            Proposal::Join { .. } => Verdict::Deny,
            _ => Verdict::Allow,
        }
    }
}

type Teleport = (PlayerId, Location, TeleportCause);

/// Records teleports; every teleport succeeds.
#[derive(Default, Clone)]
struct Recording(Arc<Mutex<Vec<Teleport>>>);

impl World for Recording {
    fn teleport(&self, player: PlayerId, to: &Location, cause: TeleportCause) -> bool {
        self.0.lock().push((player, to.clone(), cause));
        true
    }
}

fn at(x: f64) -> Location {
    Location::new("arena", x, 64.0, 0.0)
}

fn spawn(name: &str, kind: SpawnKind, team: Team) -> Spawnpoint {
    Spawnpoint::new(name, kind, team, at(name.len() as f64))
}

struct Fixture {
    mgr: ArenaManager,
    arena: ArenaId,
    rec: Arc<Recorder>,
    world: Recording,
    store: Arc<JsonSpawnStore>,
}

fn fixture(settings: ArenaSettings, spawns: Vec<Spawnpoint>) -> Fixture {
    let store = Arc::new(JsonSpawnStore::new());
    let world = Recording::default();
    let mut mgr = ArenaManager::new(world.clone(), store.clone());
    let rec = Arc::new(Recorder::default());
    mgr.subscribe(rec.clone());
    let arena = mgr.create_arena("dust", settings).unwrap();
    for s in spawns {
        assert!(mgr.add_spawn(arena, s).unwrap());
    }
    Fixture {
        mgr,
        arena,
        rec,
        world,
        store,
    }
}

fn basic_spawns() -> Vec<Spawnpoint> {
    vec![
        spawn("lobby", SpawnKind::Lobby, Team::Any),
        spawn("g1", SpawnKind::Game, Team::Any),
        spawn("g2", SpawnKind::Game, Team::Any),
        spawn("g3", SpawnKind::Game, Team::Any),
        spawn("spec", SpawnKind::Spectator, Team::Any),
    ]
}

fn register(mgr: &mut ArenaManager, n: usize) -> Vec<PlayerId> {
    (0..n)
        .map(|i| {
            let id = PlayerId::random();
            mgr.register_player(id, format!("p{i}")).unwrap();
            id
        })
        .collect()
}

/// Registers `n` players, joins them to the lobby and readies them all.
fn start_with(f: &mut Fixture, n: usize) -> Vec<PlayerId> {
    let ids = register(&mut f.mgr, n);
    for id in &ids {
        assert!(f.mgr.join(*id, f.arena).unwrap());
    }
    for id in &ids {
        f.mgr.set_ready(*id, true).unwrap();
    }
    assert!(f.mgr.arena(f.arena).unwrap().game().is_running());
    ids
}

/// A player is in exactly one context, or none at all.
fn assert_exclusive(mgr: &ArenaManager, arena: ArenaId, player: PlayerId) {
    let a = mgr.arena(arena).unwrap();
    let held = [
        a.lobby().contains(player),
        a.game().contains(player),
        a.spectator().contains(player),
    ];
    assert!(held.iter().filter(|h| **h).count() <= 1, "player in several contexts");
}

// =========================================================================
// Joining and leaving
// =========================================================================

#[test]
fn test_join_places_player_in_lobby_at_lobby_spawn() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let p = register(&mut f.mgr, 1)[0];

    assert!(f.mgr.join(p, f.arena).unwrap());

    assert_eq!(f.mgr.context_of(p), ContextKind::Lobby);
    assert_eq!(f.mgr.arena_of(p), Some(f.arena));
    assert_eq!(f.mgr.player(p).unwrap().context(), ContextKind::Lobby);
    assert!(f.mgr.player(p).unwrap().invulnerable);
    let teleports = f.world.0.lock();
    assert_eq!(teleports.as_slice(), &[(p, spawn("lobby", SpawnKind::Lobby, Team::Any).location, TeleportCause::Join)]);
}

#[test]
fn test_join_twice_is_noop() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let p = register(&mut f.mgr, 1)[0];
    assert!(f.mgr.join(p, f.arena).unwrap());
    assert!(!f.mgr.join(p, f.arena).unwrap());
    assert_eq!(f.mgr.arena(f.arena).unwrap().lobby().len(), 1);
}

#[test]
fn test_join_unknown_ids_are_errors() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let p = register(&mut f.mgr, 1)[0];

    assert!(matches!(
        f.mgr.join(PlayerId::random(), f.arena),
        Err(ArenaError::PlayerNotFound(_))
    ));
    assert!(matches!(
        f.mgr.join(p, ArenaId::random()),
        Err(ArenaError::NotFound(_))
    ));
}

#[test]
fn test_join_second_arena_is_rejected() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let other = f.mgr.create_arena("mirage", ArenaSettings::default()).unwrap();
    let p = register(&mut f.mgr, 1)[0];
    f.mgr.join(p, f.arena).unwrap();

    let err = f.mgr.join(p, other).unwrap_err();
    assert!(matches!(err, ArenaError::AlreadyInArena(id, a) if id == p && a == f.arena));
}

#[test]
fn test_vetoed_join_leaves_no_trace() {
    let mut settings = ArenaSettings::default();
    settings.lobby.reserve_spawns = true;
    let mut spawns = basic_spawns();
    spawns.push(spawn("red", SpawnKind::Game, Team::Red));
    let mut f = fixture(settings, spawns);
    let p = register(&mut f.mgr, 1)[0];
    *f.rec.deny_joins.lock() = true;

    assert!(!f.mgr.join(p, f.arena).unwrap());

    let arena = f.mgr.arena(f.arena).unwrap();
    assert!(!arena.lobby().contains(p));
    assert!(arena.lobby().membership().active_groups().next().is_none());
    assert_eq!(arena.spawns().reservation_count(), 0);
    let record = f.mgr.player(p).unwrap();
    assert_eq!(record.team(), Team::None);
    assert_eq!(record.arena(), None);
    assert_eq!(record.group(), None);
    assert_eq!(f.rec.count(|n| matches!(n, Notice::Joined { .. })), 0);
}

#[test]
fn test_leave_sends_player_to_remove_location() {
    let mut settings = ArenaSettings::default();
    settings.remove_location = Some(Location::new("hub", 0.0, 70.0, 0.0));
    let mut f = fixture(settings, basic_spawns());
    let p = register(&mut f.mgr, 1)[0];
    f.mgr.join(p, f.arena).unwrap();

    let removal = f.mgr.leave(p, LeaveReason::Leave).unwrap();

    assert_eq!(removal.fallback(), Some(&Location::new("hub", 0.0, 70.0, 0.0)));
    assert_eq!(f.mgr.context_of(p), ContextKind::None);
    assert_eq!(f.mgr.arena_of(p), None);
    let last = f.world.0.lock().last().cloned().unwrap();
    assert_eq!(last.2, TeleportCause::Leave);
}

#[test]
fn test_leave_outside_arena_is_error() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let p = register(&mut f.mgr, 1)[0];
    assert!(matches!(
        f.mgr.leave(p, LeaveReason::Leave),
        Err(ArenaError::NotInArena(_))
    ));
}

#[test]
fn test_leaving_lobby_drops_group_from_active_set() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 2);
    for id in &ids {
        f.mgr.join(*id, f.arena).unwrap();
    }

    for id in &ids {
        f.mgr.leave(*id, LeaveReason::Leave).unwrap();
    }

    let lobby = f.mgr.arena(f.arena).unwrap().lobby();
    assert!(lobby.is_empty());
    assert_eq!(lobby.membership().active_groups().count(), 0);
    assert_eq!(f.mgr.players().group_count(), 0);
}

#[test]
fn test_relocating_listener_overrides_spawn_and_skips_reservation() {
    let mut settings = ArenaSettings::default();
    settings.lobby.reserve_spawns = true;
    let mut f = fixture(settings, basic_spawns());
    f.mgr.subscribe(Arc::new(Relocate(at(99.0))));
    let p = register(&mut f.mgr, 1)[0];

    f.mgr.join(p, f.arena).unwrap();

    assert_eq!(f.world.0.lock().last().unwrap().1, at(99.0));
    assert_eq!(f.mgr.arena(f.arena).unwrap().spawns().reservation_count(), 0);
}

#[test]
fn test_dispose_player_removes_from_arena() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let p = register(&mut f.mgr, 1)[0];
    f.mgr.join(p, f.arena).unwrap();

    f.mgr.dispose_player(p).unwrap();

    assert!(f.mgr.player(p).is_none());
    assert!(f.mgr.arena(f.arena).unwrap().lobby().is_empty());
    assert_eq!(
        f.rec.count(|n| matches!(n, Notice::Left { reason: LeaveReason::Quit, .. })),
        1
    );
}

// =========================================================================
// Starting games
// =========================================================================

#[test]
fn test_two_ready_players_start_game() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 2);
    for id in &ids {
        f.mgr.join(*id, f.arena).unwrap();
    }

    f.mgr.set_ready(ids[0], true).unwrap();
    assert!(!f.mgr.arena(f.arena).unwrap().game().is_running());

    f.mgr.set_ready(ids[1], true).unwrap();

    let starts = f.rec.starts.lock();
    assert_eq!(starts.len(), 1);
    assert_eq!(starts[0].reason, StartReason::PlayersReady);
    assert_eq!(starts[0].candidates, ids);

    let arena = f.mgr.arena(f.arena).unwrap();
    assert!(arena.game().is_running());
    assert!(arena.game().started_at().is_some());
    for id in &ids {
        assert_eq!(arena.context_of(*id), ContextKind::Game);
        assert_exclusive(&f.mgr, f.arena, *id);
        assert!(!f.mgr.player(*id).unwrap().is_ready());
        assert_eq!(f.mgr.player(*id).unwrap().lives, 1);
    }
    assert_eq!(arena.spawns().reservation_count(), 2);
}

#[test]
fn test_single_ready_player_below_minimum_does_not_start() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let p = register(&mut f.mgr, 1)[0];
    f.mgr.join(p, f.arena).unwrap();

    assert!(f.mgr.set_ready(p, true).unwrap());

    assert!(!f.mgr.arena(f.arena).unwrap().game().is_running());
    assert!(f.rec.starts.lock().is_empty());
}

#[test]
fn test_party_starts_without_unready_stranger() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 3);
    f.mgr.party(&[ids[1], ids[2]]).unwrap();
    for id in &ids {
        f.mgr.join(*id, f.arena).unwrap();
    }

    f.mgr.set_ready(ids[1], true).unwrap();
    f.mgr.set_ready(ids[2], true).unwrap();

    let arena = f.mgr.arena(f.arena).unwrap();
    assert!(arena.game().is_running());
    assert_eq!(arena.game().players(), vec![ids[1], ids[2]]);
    assert_eq!(arena.context_of(ids[0]), ContextKind::Lobby);
}

#[test]
fn test_party_rejects_player_in_arena() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 2);
    f.mgr.join(ids[0], f.arena).unwrap();
    assert!(matches!(
        f.mgr.party(&ids),
        Err(ArenaError::AlreadyInArena(..))
    ));
}

#[test]
fn test_start_refused_when_disabled_or_busy() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 2);
    for id in &ids {
        f.mgr.join(*id, f.arena).unwrap();
    }

    f.mgr.set_busy(f.arena, true).unwrap();
    assert!(!f.mgr.arena(f.arena).unwrap().can_start());
    assert!(!f.mgr.start_game(f.arena, StartReason::Admin).unwrap());
    assert!(!f.mgr.start_game(f.arena, StartReason::Auto).unwrap());
    assert!(!f.mgr.arena(f.arena).unwrap().game().is_running());

    f.mgr.set_busy(f.arena, false).unwrap();
    f.mgr.set_enabled(f.arena, false).unwrap();
    assert!(!f.mgr.start_game(f.arena, StartReason::Auto).unwrap());
    assert!(!f.mgr.arena(f.arena).unwrap().game().is_running());
}

#[test]
fn test_start_releases_busy_flag() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    start_with(&mut f, 2);

    let arena = f.mgr.arena(f.arena).unwrap();
    assert!(!arena.is_busy());
    assert_eq!(arena.game().len(), 2);
}

#[test]
fn test_admin_start_needs_ready_group_auto_start_does_not() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 2);
    for id in &ids {
        f.mgr.join(*id, f.arena).unwrap();
    }

    assert!(!f.mgr.start_game(f.arena, StartReason::Admin).unwrap());
    assert!(f.mgr.start_game(f.arena, StartReason::Auto).unwrap());
    assert_eq!(f.mgr.arena(f.arena).unwrap().game().len(), 2);
    assert!(!f.mgr.start_game(f.arena, StartReason::Auto).unwrap());
}

#[test]
fn test_single_red_spawn_is_reserved_by_first_player_only() {
    let spawns = vec![
        spawn("lobby", SpawnKind::Lobby, Team::Any),
        spawn("red", SpawnKind::Game, Team::Red),
    ];
    let mut f = fixture(ArenaSettings::default(), spawns);

    let ids = start_with(&mut f, 2);

    let arena = f.mgr.arena(f.arena).unwrap();
    for id in &ids {
        assert_eq!(f.mgr.player(*id).unwrap().team(), Team::Red);
    }
    assert_eq!(arena.spawns().reserved_by(ids[0]).unwrap().name, "red");
    assert!(arena.spawns().reserved_by(ids[1]).is_none());
    assert!(arena.spawns().random_for(&SpawnKind::Game, Team::Red).is_none());
    assert_eq!(arena.context_of(ids[1]), ContextKind::Game);
    assert!(f.rec.notices.lock().contains(&Notice::Joined {
        arena: f.arena,
        player: ids[1],
        context: ContextKind::Game,
        location: None,
    }));
}

// =========================================================================
// Countdown
// =========================================================================

#[test]
fn test_countdown_ticks_then_starts_game() {
    let mut settings = ArenaSettings::default();
    settings.lobby.countdown_secs = 2;
    let mut f = fixture(settings, basic_spawns());
    let ids = register(&mut f.mgr, 2);
    for id in &ids {
        f.mgr.join(*id, f.arena).unwrap();
    }

    assert_eq!(f.mgr.tick_lobbies(), 0);
    assert_eq!(f.mgr.arena(f.arena).unwrap().lobby().countdown(), Some(2));
    assert_eq!(f.mgr.tick_lobbies(), 0);
    assert_eq!(f.mgr.tick_lobbies(), 1);

    let ticks: Vec<u32> = f
        .rec
        .notices
        .lock()
        .iter()
        .filter_map(|n| match n {
            Notice::CountdownTick { remaining, .. } => Some(*remaining),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![2, 1]);
    assert_eq!(f.rec.starts.lock()[0].reason, StartReason::Auto);
    assert!(f.mgr.arena(f.arena).unwrap().game().is_running());
}

#[test]
fn test_countdown_cancelled_when_lobby_drains() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 2);
    for id in &ids {
        f.mgr.join(*id, f.arena).unwrap();
    }
    f.mgr.tick_lobbies();

    f.mgr.leave(ids[0], LeaveReason::Leave).unwrap();
    f.mgr.tick_lobbies();

    assert_eq!(f.rec.count(|n| matches!(n, Notice::CountdownCancelled { .. })), 1);
    assert_eq!(f.mgr.arena(f.arena).unwrap().lobby().countdown(), None);
}

#[test]
fn test_countdown_idle_when_auto_start_disabled() {
    let mut settings = ArenaSettings::default();
    settings.lobby.auto_start = false;
    let mut f = fixture(settings, basic_spawns());
    let ids = register(&mut f.mgr, 2);
    for id in &ids {
        f.mgr.join(*id, f.arena).unwrap();
    }

    for _ in 0..20 {
        assert_eq!(f.mgr.tick_lobbies(), 0);
    }
    assert_eq!(f.rec.count(|n| matches!(n, Notice::CountdownTick { .. })), 0);
}

// =========================================================================
// Ending games
// =========================================================================

#[test]
fn test_set_winner_team_notices() {
    let spawns = vec![
        spawn("lobby", SpawnKind::Lobby, Team::Any),
        spawn("r1", SpawnKind::Game, Team::Red),
        spawn("b1", SpawnKind::Game, Team::Blue),
        spawn("r2", SpawnKind::Game, Team::Red),
    ];
    let mut f = fixture(ArenaSettings::default(), spawns);
    let ids = start_with(&mut f, 3);
    let teams: Vec<Team> = ids.iter().map(|id| f.mgr.player(*id).unwrap().team()).collect();
    assert_eq!(teams, vec![Team::Red, Team::Blue, Team::Red]);

    assert!(f.mgr.set_winner(f.arena, Winner::Team(Team::Blue)).unwrap());

    assert_eq!(f.rec.count(|n| matches!(n, Notice::PlayerWon { .. })), 1);
    assert_eq!(f.rec.count(|n| matches!(n, Notice::PlayerLost { .. })), 2);
    assert_eq!(f.rec.count(|n| matches!(n, Notice::TeamWon { team: Team::Blue, .. })), 1);
    let arena = f.mgr.arena(f.arena).unwrap();
    assert!(!arena.game().is_running());
    assert!(arena.game().is_empty());
    assert_eq!(arena.spawns().reservation_count(), 0);
    assert_eq!(f.mgr.player(ids[1]).unwrap().total_points, 1);
    assert_eq!(f.mgr.player(ids[0]).unwrap().total_points, 0);
}

#[test]
fn test_end_removes_everyone_with_game_ended() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = start_with(&mut f, 2);

    assert!(f.mgr.end_game(f.arena).unwrap());
    assert!(!f.mgr.end_game(f.arena).unwrap());

    assert_eq!(
        f.rec.count(|n| matches!(n, Notice::Left { reason: LeaveReason::GameEnded, .. })),
        2
    );
    assert_eq!(f.rec.count(|n| matches!(n, Notice::GameEnded { .. })), 1);
    for id in &ids {
        assert_eq!(f.mgr.arena_of(*id), None);
        assert_eq!(f.mgr.player(*id).unwrap().team(), Team::None);
    }
}

#[test]
fn test_game_ends_when_last_player_leaves() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = start_with(&mut f, 2);

    f.mgr.leave(ids[0], LeaveReason::Leave).unwrap();
    assert!(f.mgr.arena(f.arena).unwrap().game().is_running());

    f.mgr.leave(ids[1], LeaveReason::Quit).unwrap();
    assert!(!f.mgr.arena(f.arena).unwrap().game().is_running());
    assert_eq!(f.rec.count(|n| matches!(n, Notice::GameEnded { .. })), 1);
}

#[test]
fn test_when_empty_policy_keeps_single_survivor_playing() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = start_with(&mut f, 2);

    f.mgr.eliminate(ids[0]).unwrap();

    assert!(f.mgr.arena(f.arena).unwrap().game().is_running());
    assert_eq!(f.rec.count(|n| matches!(n, Notice::PlayerWon { .. })), 0);
}

#[test]
fn test_last_player_standing_wins() {
    let mut settings = ArenaSettings::default();
    settings.game.game_over = GameOverPolicy::LastPlayerStanding;
    let mut f = fixture(settings, basic_spawns());
    let ids = start_with(&mut f, 2);

    assert!(f.mgr.eliminate(ids[0]).unwrap());

    assert!(!f.mgr.arena(f.arena).unwrap().game().is_running());
    assert!(f.rec.notices.lock().contains(&Notice::PlayerWon {
        arena: f.arena,
        player: ids[1],
    }));
    assert_eq!(f.mgr.player(ids[1]).unwrap().total_points, 1);
}

#[test]
fn test_last_team_standing_wins() {
    let mut settings = ArenaSettings::default();
    settings.game.game_over = GameOverPolicy::LastTeamStanding;
    let spawns = vec![
        spawn("lobby", SpawnKind::Lobby, Team::Any),
        spawn("r1", SpawnKind::Game, Team::Red),
        spawn("b1", SpawnKind::Game, Team::Blue),
    ];
    let mut f = fixture(settings, spawns);
    start_with(&mut f, 3);

    assert!(f.mgr.set_loser(f.arena, Team::Blue).unwrap());

    assert_eq!(f.rec.count(|n| matches!(n, Notice::TeamLost { team: Team::Blue, .. })), 1);
    assert_eq!(f.rec.count(|n| matches!(n, Notice::TeamWon { team: Team::Red, .. })), 1);
    assert!(!f.mgr.arena(f.arena).unwrap().game().is_running());
}

#[test]
fn test_set_loser_removes_team_with_lose() {
    let spawns = vec![
        spawn("lobby", SpawnKind::Lobby, Team::Any),
        spawn("r1", SpawnKind::Game, Team::Red),
        spawn("b1", SpawnKind::Game, Team::Blue),
    ];
    let mut f = fixture(ArenaSettings::default(), spawns);
    let ids = start_with(&mut f, 3);

    assert!(f.mgr.set_loser(f.arena, Team::Red).unwrap());

    let arena = f.mgr.arena(f.arena).unwrap();
    assert!(arena.game().is_running());
    assert_eq!(arena.game().players(), vec![ids[1]]);
    assert_eq!(
        f.rec.count(|n| matches!(n, Notice::Left { reason: LeaveReason::Lose, .. })),
        2
    );
}

#[test]
fn test_eliminated_player_spectates_when_configured() {
    let mut settings = ArenaSettings::default();
    settings.game.spectate_on_lose = true;
    let mut f = fixture(settings, basic_spawns());
    let ids = start_with(&mut f, 2);

    assert!(f.mgr.eliminate(ids[0]).unwrap());

    assert_eq!(f.mgr.context_of(ids[0]), ContextKind::Spectator);
    assert_eq!(f.mgr.arena_of(ids[0]), Some(f.arena));
    assert_exclusive(&f.mgr, f.arena, ids[0]);
    assert!(f.mgr.player(ids[0]).unwrap().invulnerable);
    assert!(f.mgr.arena(f.arena).unwrap().game().is_running());
}

#[test]
fn test_lose_life_eliminates_at_zero() {
    let mut settings = ArenaSettings::default();
    settings.game.lives = 2;
    let mut f = fixture(settings, basic_spawns());
    let ids = start_with(&mut f, 2);

    assert_eq!(f.mgr.lose_life(ids[0]).unwrap(), Some(1));
    assert_eq!(f.mgr.context_of(ids[0]), ContextKind::Game);

    assert_eq!(f.mgr.lose_life(ids[0]).unwrap(), Some(0));
    assert_eq!(f.mgr.context_of(ids[0]), ContextKind::None);
}

// =========================================================================
// Spectating and forwarding
// =========================================================================

#[test]
fn test_spectate_from_outside_and_from_lobby() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 2);

    assert!(f.mgr.spectate(ids[0], f.arena).unwrap());
    assert_eq!(f.mgr.context_of(ids[0]), ContextKind::Spectator);

    f.mgr.join(ids[1], f.arena).unwrap();
    assert!(!f.mgr.spectate(ids[1], f.arena).unwrap());
    assert_eq!(f.mgr.context_of(ids[1]), ContextKind::Lobby);
    assert!(!f.mgr.join(ids[0], f.arena).unwrap());
    assert_exclusive(&f.mgr, f.arena, ids[0]);
}

#[test]
fn test_forward_player_to_idle_arena_lands_in_lobby() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let other = f.mgr.create_arena("mirage", ArenaSettings::default()).unwrap();
    let ids = start_with(&mut f, 2);

    assert!(f.mgr.forward_player(ids[0], other).unwrap());

    assert_eq!(f.mgr.arena_of(ids[0]), Some(other));
    assert_eq!(f.mgr.context_of(ids[0]), ContextKind::Lobby);
    assert!(f.mgr.arena(f.arena).unwrap().game().is_running());
    assert!(f.rec.notices.lock().contains(&Notice::Forwarded {
        from: f.arena,
        to: other,
        player: ids[0],
    }));
}

#[test]
fn test_forward_player_into_running_game() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let other = f.mgr.create_arena("mirage", ArenaSettings::default()).unwrap();
    for s in basic_spawns() {
        assert!(f.mgr.add_spawn(other, s).unwrap());
    }
    let there = register(&mut f.mgr, 2);
    for id in &there {
        f.mgr.join(*id, other).unwrap();
    }
    for id in &there {
        f.mgr.set_ready(*id, true).unwrap();
    }
    assert!(f.mgr.arena(other).unwrap().game().is_running());
    let ids = start_with(&mut f, 2);

    assert!(f.mgr.forward_player(ids[0], other).unwrap());

    let target = f.mgr.arena(other).unwrap();
    assert!(target.game().contains(ids[0]));
    assert_eq!(target.game().len(), 3);
    assert_eq!(f.mgr.context_of(ids[0]), ContextKind::Game);
    assert_eq!(f.mgr.player(ids[0]).unwrap().lives, 1);
    assert!(target.spawns().reserved_by(ids[0]).is_some());
    assert_eq!(
        f.rec.count(|n| matches!(
            n,
            Notice::Joined { arena, player, context: ContextKind::Game, .. }
                if *arena == other && *player == ids[0]
        )),
        1
    );
    assert_exclusive(&f.mgr, other, ids[0]);
}

#[test]
fn test_forward_last_players_ends_empty_game() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let other = f.mgr.create_arena("mirage", ArenaSettings::default()).unwrap();
    let ids = start_with(&mut f, 2);

    assert!(f.mgr.forward_player(ids[0], other).unwrap());
    assert!(f.mgr.arena(f.arena).unwrap().game().is_running());
    assert!(f.mgr.forward_player(ids[1], other).unwrap());

    let source = f.mgr.arena(f.arena).unwrap();
    assert!(!source.game().is_running());
    assert!(source.can_start());
    assert_eq!(source.spawns().reservation_count(), 0);
    assert_eq!(
        f.rec.count(|n| matches!(n, Notice::GameEnded { arena } if *arena == f.arena)),
        1
    );
    assert_eq!(
        f.rec.count(|n| matches!(n, Notice::PlayerWon { .. } | Notice::PlayerLost { .. })),
        0
    );
}

#[test]
fn test_forward_player_refused_by_target_is_not_rolled_back() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let other = f.mgr.create_arena("mirage", ArenaSettings::default()).unwrap();
    f.mgr.arena_mut(other).unwrap().subscribe(Arc::new(DenyJoins));
    let ids = start_with(&mut f, 2);

    assert!(!f.mgr.forward_player(ids[0], other).unwrap());

    assert_eq!(f.mgr.arena_of(ids[0]), None);
    assert_eq!(f.mgr.context_of(ids[0]), ContextKind::None);
    assert!(!f.mgr.arena(f.arena).unwrap().game().contains(ids[0]));
}

#[test]
fn test_forward_lobby_player_is_refused() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let other = f.mgr.create_arena("mirage", ArenaSettings::default()).unwrap();
    let p = register(&mut f.mgr, 1)[0];
    f.mgr.join(p, f.arena).unwrap();

    assert!(!f.mgr.forward_player(p, other).unwrap());
    assert_eq!(f.mgr.context_of(p), ContextKind::Lobby);
}

// =========================================================================
// Vetoed removals
// =========================================================================

#[test]
fn test_vetoed_leave_keeps_player_and_reservation() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = start_with(&mut f, 2);
    let group = f.mgr.player(ids[0]).unwrap().group();
    let held = f.mgr.arena(f.arena).unwrap().spawns().reserved_by(ids[0]).cloned();
    assert!(held.is_some());
    *f.rec.deny_leaves.lock() = true;

    let removal = f.mgr.leave(ids[0], LeaveReason::Leave).unwrap();

    assert_eq!(removal, Removal::Cancelled);
    let arena = f.mgr.arena(f.arena).unwrap();
    assert!(arena.game().contains(ids[0]));
    assert!(arena.game().is_running());
    assert_eq!(arena.spawns().reserved_by(ids[0]).cloned(), held);
    let record = f.mgr.player(ids[0]).unwrap();
    assert_eq!(record.group(), group);
    assert_eq!(record.context(), ContextKind::Game);
    assert_eq!(record.arena(), Some(f.arena));
    assert_eq!(f.rec.count(|n| matches!(n, Notice::Left { .. })), 0);
}

#[test]
fn test_end_game_completes_despite_leave_veto() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = start_with(&mut f, 2);
    *f.rec.deny_leaves.lock() = true;

    assert!(f.mgr.end_game(f.arena).unwrap());

    let arena = f.mgr.arena(f.arena).unwrap();
    assert!(!arena.game().is_running());
    assert!(arena.game().is_empty());
    for id in &ids {
        assert_eq!(f.mgr.arena_of(*id), None);
        assert_eq!(f.mgr.context_of(*id), ContextKind::None);
    }
}

#[test]
fn test_disable_completes_despite_leave_veto() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 2);
    f.mgr.join(ids[0], f.arena).unwrap();
    f.mgr.spectate(ids[1], f.arena).unwrap();
    *f.rec.deny_leaves.lock() = true;

    f.mgr.set_enabled(f.arena, false).unwrap();

    assert!(f.mgr.arena(f.arena).unwrap().players().is_empty());
    assert_eq!(f.mgr.arena_of(ids[0]), None);
    assert_eq!(f.mgr.arena_of(ids[1]), None);
}

// =========================================================================
// Administration
// =========================================================================

#[test]
fn test_disable_removes_everyone_and_refuses_joins() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let ids = register(&mut f.mgr, 3);
    f.mgr.join(ids[0], f.arena).unwrap();
    f.mgr.spectate(ids[1], f.arena).unwrap();

    f.mgr.set_enabled(f.arena, false).unwrap();

    assert!(f.mgr.arena(f.arena).unwrap().players().is_empty());
    assert_eq!(
        f.rec.count(|n| matches!(n, Notice::Left { reason: LeaveReason::Disabled, .. })),
        2
    );
    assert!(matches!(
        f.mgr.join(ids[2], f.arena),
        Err(ArenaError::Disabled(_))
    ));
}

#[test]
fn test_remove_arena_purges_spawns_and_metadata() {
    let mut f = fixture(ArenaSettings::default(), basic_spawns());
    let p = register(&mut f.mgr, 1)[0];
    f.mgr.join(p, f.arena).unwrap();
    f.mgr.player_mut(p).unwrap().meta.arena_mut(f.arena).set("kills", 3);
    f.mgr.player_mut(p).unwrap().meta.global.set("rank", "gold");

    f.mgr.remove_arena(f.arena).unwrap();

    assert!(f.mgr.arena(f.arena).is_none());
    assert!(f.store.load(f.arena).unwrap().is_empty());
    let record = f.mgr.player(p).unwrap();
    assert_eq!(record.arena(), None);
    assert!(record.meta.arena(f.arena).is_none());
    assert!(record.meta.global.contains("rank"));
    assert!(matches!(
        f.mgr.remove_arena(f.arena),
        Err(ArenaError::NotFound(_))
    ));
}

#[test]
fn test_arena_reloads_persisted_spawns() {
    let f = fixture(ArenaSettings::default(), basic_spawns());
    assert_eq!(f.store.load(f.arena).unwrap().len(), 5);

    let reloaded = skirmish_arena::Arena::new(
        f.arena,
        "dust",
        ArenaSettings::default(),
        f.store.clone(),
        skirmish_types::EventBus::new(),
    )
    .unwrap();
    assert_eq!(reloaded.spawns().len(), 5);
}

#[test]
fn test_remove_spawn_refreshes_teams() {
    let spawns = vec![
        spawn("r1", SpawnKind::Game, Team::Red),
        spawn("b1", SpawnKind::Game, Team::Blue),
    ];
    let mut f = fixture(ArenaSettings::default(), spawns);
    assert_eq!(f.mgr.arena(f.arena).unwrap().teams().teams().count(), 2);

    assert!(f.mgr.remove_spawn(f.arena, "b1").unwrap());

    let teams: Vec<_> = f.mgr.arena(f.arena).unwrap().teams().teams().collect();
    assert_eq!(teams, vec![Team::Red]);
}
