//! Single binary web server: tournament progression API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default so the app is reachable via DNS on a VPS.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use pool_tournament_web::{
    advance_group, calculate_standings, confirm_match_result, initialize_next_level,
    pending_approvals, roster_from_csv, start_tournament, AdvanceTrigger, AutomationMode,
    Geography, GroupId, Level, MatchConfirmation, MatchRecord, Registration, Tournament,
    TournamentError, TournamentId, Winner,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Per-tournament entry: tournament data + last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    last_activity: Instant,
}

/// In-memory state: many tournaments by ID. Entries are removed after 12h inactivity.
/// The single writer lock also serializes progression, so two confirmations
/// for the same group can never both generate the next round.
type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;

/// Inactivity threshold: tournaments not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    special: bool,
    #[serde(default)]
    automation_mode: AutomationMode,
    #[serde(default = "default_winners_per_group")]
    winners_per_group: u32,
}

fn default_winners_per_group() -> u32 {
    3
}

#[derive(Deserialize)]
struct RosterBody {
    registrations: Vec<Registration>,
    #[serde(default)]
    geography: Geography,
}

#[derive(Deserialize)]
struct ConfirmMatchBody {
    winner_id: Uuid,
    player_1_points: u32,
    player_2_points: u32,
    #[serde(default)]
    submitted_by: Option<Uuid>,
}

#[derive(Deserialize)]
struct AdvanceBody {
    level: String,
    #[serde(default)]
    group_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct AutomationModeBody {
    automation_mode: AutomationMode,
}

#[derive(Deserialize)]
struct MatchFilter {
    level: Option<String>,
    group: Option<Uuid>,
}

#[derive(Deserialize)]
struct GroupQuery {
    level: String,
    group: Option<Uuid>,
}

#[derive(Deserialize)]
struct WinnersFilter {
    level: Option<String>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and match id.
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: Uuid,
}

/// Path segments: tournament id and level name.
#[derive(Deserialize)]
struct TournamentLevelPath {
    id: TournamentId,
    level: String,
}

fn error_json(e: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": e.to_string() })
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "pool-tournament-web",
    })
}

/// Create a new tournament (returns it with id; client stores id for subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let tournament = Tournament::new(
        body.name.trim(),
        body.special,
        body.automation_mode,
        body.winners_per_group,
    );
    let id = tournament.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    g.insert(
        id,
        TournamentEntry {
            tournament,
            last_activity: Instant::now(),
        },
    );
    HttpResponse::Ok().json(&g.get(&id).unwrap().tournament)
}

/// Get a tournament by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(&entry.tournament)
        }
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Replace the roster from JSON (tournament must not have started).
#[put("/api/tournaments/{id}/roster")]
async fn api_set_roster(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<RosterBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    let body = body.into_inner();
    match t.set_roster(body.registrations, body.geography) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(error_json(e)),
    }
}

/// Replace the roster from a CSV body with columns player,community,county,region.
#[put("/api/tournaments/{id}/roster/csv")]
async fn api_set_roster_csv(
    state: AppState,
    path: Path<TournamentPath>,
    body: String,
) -> HttpResponse {
    let import = match roster_from_csv(&body) {
        Ok(import) => import,
        Err(e) => return HttpResponse::BadRequest().json(error_json(e)),
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.set_roster(import.registrations, import.geography) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(error_json(e)),
    }
}

/// Switch automatic/manual progression (any time before completion).
#[put("/api/tournaments/{id}/automation-mode")]
async fn api_set_automation_mode(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<AutomationModeBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.set_automation_mode(body.automation_mode) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(error_json(e)),
    }
}

/// Start the tournament: group the eligible roster and open the first level.
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match start_tournament(t) {
        Ok(_) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(error_json(e)),
    }
}

/// Confirm a match result; responds with the progression report (what the
/// engine did next, and any step errors it absorbed).
#[post("/api/tournaments/{id}/matches/{match_id}/confirm")]
async fn api_confirm_match(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<ConfirmMatchBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    let confirmation = MatchConfirmation {
        match_id: path.match_id,
        winner_id: body.winner_id,
        player_1_points: body.player_1_points,
        player_2_points: body.player_2_points,
        submitted_by: body.submitted_by,
    };
    match confirm_match_result(t, &confirmation) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => HttpResponse::BadRequest().json(error_json(e)),
    }
}

/// List matches, optionally narrowed to a level or one group.
#[get("/api/tournaments/{id}/matches")]
async fn api_list_matches(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<MatchFilter>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &entry.tournament;
    let rows: Vec<&MatchRecord> = match (&query.level, query.group) {
        (None, None) => t.matches.iter().collect(),
        (None, Some(_)) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "level is required when filtering by group" }))
        }
        (Some(level), group) => {
            let level: Level = match level.parse() {
                Ok(l) => l,
                Err(()) => {
                    return HttpResponse::BadRequest()
                        .json(serde_json::json!({ "error": "Unknown level" }))
                }
            };
            match group {
                None => t.matches.iter().filter(|m| m.level == level).collect(),
                Some(id) => match GroupId::from_parts(level, Some(id)) {
                    Some(group) => t.matches_in_group(level, group),
                    None => {
                        return HttpResponse::BadRequest()
                            .json(serde_json::json!({ "error": "Unknown level" }))
                    }
                },
            }
        }
    };
    HttpResponse::Ok().json(rows)
}

/// Round-robin standings for one group (empty if no round robin exists).
#[get("/api/tournaments/{id}/standings")]
async fn api_standings(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<GroupQuery>,
) -> HttpResponse {
    let level: Level = match query.level.parse() {
        Ok(l) => l,
        Err(()) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Unknown level" }))
        }
    };
    let group = match GroupId::from_parts(level, query.group) {
        Some(g) => g,
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "group is required at this level" }))
        }
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    HttpResponse::Ok().json(calculate_standings(&entry.tournament, level, group))
}

/// Winner rows, optionally narrowed to one level.
#[get("/api/tournaments/{id}/winners")]
async fn api_list_winners(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<WinnersFilter>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &entry.tournament;
    let rows: Vec<&Winner> = match &query.level {
        None => t.winners.iter().collect(),
        Some(level) => {
            let level: Level = match level.parse() {
                Ok(l) => l,
                Err(()) => {
                    return HttpResponse::BadRequest()
                        .json(serde_json::json!({ "error": "Unknown level" }))
                }
            };
            t.winners_at_level(level)
        }
    };
    HttpResponse::Ok().json(rows)
}

/// Progression steps waiting on an admin (manual mode) or on a retry.
#[get("/api/tournaments/{id}/pending-approvals")]
async fn api_pending_approvals(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    HttpResponse::Ok().json(pending_approvals(&entry.tournament))
}

/// Admin trigger: run the one step a group is due for. A group that already
/// progressed is a no-op success.
#[post("/api/tournaments/{id}/advance")]
async fn api_advance_group(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<AdvanceBody>,
) -> HttpResponse {
    let level: Level = match body.level.parse() {
        Ok(l) => l,
        Err(()) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Unknown level" }))
        }
    };
    let group = match GroupId::from_parts(level, body.group_id) {
        Some(g) => g,
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "group_id is required at this level" }))
        }
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match advance_group(t, group, AdvanceTrigger::AdminAction) {
        Ok(_) => HttpResponse::Ok().json(t),
        Err(TournamentError::GroupAlreadyProgressed { .. }) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(error_json(e)),
    }
}

/// Admin trigger: seed the level after {level} from its winners. {level}
/// must be fully decided; an already-initialized next level is a no-op
/// success.
#[post("/api/tournaments/{id}/levels/{level}/initialize")]
async fn api_initialize_level(state: AppState, path: Path<TournamentLevelPath>) -> HttpResponse {
    let level: Level = match path.level.parse() {
        Ok(l) => l,
        Err(()) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Unknown level" }))
        }
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match initialize_next_level(t, level) {
        Ok(_) => HttpResponse::Ok().json(t),
        Err(TournamentError::GroupAlreadyProgressed { .. }) => HttpResponse::Ok().json(t),
        Err(TournamentError::IncompleteLevel { level, missing }) => HttpResponse::BadRequest()
            .json(serde_json::json!({
                "error": format!("{} level incomplete", level.label()),
                "missing": missing,
            })),
        Err(e) => HttpResponse::BadRequest().json(error_json(e)),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));

    // Background task: every 30 minutes, remove tournaments inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_set_roster)
            .service(api_set_roster_csv)
            .service(api_set_automation_mode)
            .service(api_start_tournament)
            .service(api_confirm_match)
            .service(api_list_matches)
            .service(api_standings)
            .service(api_list_winners)
            .service(api_pending_approvals)
            .service(api_advance_group)
            .service(api_initialize_level)
    })
    .bind(bind)?
    .run()
    .await
}
