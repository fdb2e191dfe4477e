//! Daily challenges
//!
//! Every calendar date maps to one of seven challenge kinds by weekday, with
//! a seed (`YYYYMMDD`) that fixes the day's shape sequence and any random
//! choices. A date can be completed once; after that it cannot be started
//! again.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::{self, Catalog, Difficulty};
use super::generator::Lcg;
use super::grid::{CompletedLines, Grid};
use super::shape::Shape;
use crate::consts::GRID_SIZE;
use crate::persistence::{self, Storage};

/// Time-Attack countdown
pub const TIME_ATTACK_DURATION_MS: u64 = 180_000;
/// Below this the urgency bonus applies
pub const URGENCY_THRESHOLD_MS: u64 = 30_000;
pub const URGENCY_BONUS: f64 = 2.0;
/// Score needed before the Time-Attack countdown runs out
pub const TIME_ATTACK_TARGET: u64 = 3_000;

/// Distinct base kinds allowed in Shape-Master
pub const SHAPE_MASTER_KINDS: usize = 3;

pub const CASCADE_STEP: f64 = 0.5;
pub const CASCADE_MAX: f64 = 10.0;

/// Placements closer together than this speed the run up
pub const SPEED_WINDOW_MS: u64 = 2_000;
pub const SPEED_STEP: f64 = 0.1;
pub const SPEED_MAX: f64 = 5.0;

pub const ZEN_MIRROR_BONUS: u32 = 50;
pub const ZEN_DIAGONAL_BONUS: u32 = 30;

pub const BOSS_HEALTH: u32 = 1_000;
pub const BOSS_DAMAGE: u32 = 100;

pub const BASE_REWARD: u64 = 100;
pub const STREAK_BONUS_PER_DAY: u64 = 20;
pub const STREAK_BONUS_CAP: u64 = 500;
pub const PERFECT_BONUS: u64 = 250;

/// `num_days_from_ce` of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Hidden pictures for Mystery-Grid (`#` = hidden cell)
const MYSTERY_PATTERNS: &[[&str; GRID_SIZE]] = &[
    [
        "....##....",
        "...####...",
        "..######..",
        ".########.",
        "##########",
        "##########",
        ".########.",
        "..######..",
        "...####...",
        "....##....",
    ],
    [
        "....##....",
        "....##....",
        "....##....",
        "....##....",
        "##########",
        "##########",
        "....##....",
        "....##....",
        "....##....",
        "....##....",
    ],
    [
        "##########",
        "#........#",
        "#........#",
        "#........#",
        "#........#",
        "#........#",
        "#........#",
        "#........#",
        "#........#",
        "##########",
    ],
    [
        "..........",
        "..##..##..",
        "..##..##..",
        "..........",
        "..........",
        ".#......#.",
        "..#....#..",
        "...####...",
        "..........",
        "..........",
    ],
];

/// Cells of a mystery picture
fn mystery_cells(index: usize) -> Vec<(usize, usize)> {
    MYSTERY_PATTERNS[index % MYSTERY_PATTERNS.len()]
        .iter()
        .enumerate()
        .flat_map(|(r, line)| {
            line.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'#')
                .map(move |(c, _)| (r, c))
        })
        .collect()
}

/// The seven daily challenge kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeKind {
    TimeAttack,
    ShapeMaster,
    MysteryGrid,
    Cascade,
    SpeedRun,
    Zen,
    BossBattle,
}

impl ChallengeKind {
    /// Fixed weekday mapping
    pub fn for_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => ChallengeKind::Zen,
            Weekday::Mon => ChallengeKind::TimeAttack,
            Weekday::Tue => ChallengeKind::ShapeMaster,
            Weekday::Wed => ChallengeKind::MysteryGrid,
            Weekday::Thu => ChallengeKind::Cascade,
            Weekday::Fri => ChallengeKind::SpeedRun,
            Weekday::Sat => ChallengeKind::BossBattle,
        }
    }

    /// Scoring bonus for the kind
    pub fn base_multiplier(&self) -> f64 {
        match self {
            ChallengeKind::TimeAttack => 1.5,
            ChallengeKind::ShapeMaster => 1.3,
            ChallengeKind::MysteryGrid => 1.4,
            ChallengeKind::Cascade => 1.2,
            ChallengeKind::SpeedRun => 1.6,
            ChallengeKind::Zen => 1.0,
            ChallengeKind::BossBattle => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeKind::TimeAttack => "time_attack",
            ChallengeKind::ShapeMaster => "shape_master",
            ChallengeKind::MysteryGrid => "mystery_grid",
            ChallengeKind::Cascade => "cascade",
            ChallengeKind::SpeedRun => "speed_run",
            ChallengeKind::Zen => "zen",
            ChallengeKind::BossBattle => "boss_battle",
        }
    }
}

/// `YYYYMMDD` as an integer
pub fn date_seed(date: NaiveDate) -> u64 {
    date.year().max(0) as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64
}

pub fn challenge_type_for(date: NaiveDate) -> ChallengeKind {
    ChallengeKind::for_weekday(date.weekday())
}

/// Whole weeks since 1970-01-01
pub fn epoch_week(date: NaiveDate) -> u64 {
    let days = date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE;
    (days.max(0) / 7) as u64
}

/// This week's boss weakness, a kind from the difficulty's catalog
pub fn weekly_weakness(date: NaiveDate, difficulty: Difficulty) -> usize {
    let catalog = Catalog::for_difficulty(difficulty);
    let index = (epoch_week(date) % catalog.len().max(1) as u64) as usize;
    catalog.get(index).map(|(kind, _)| kind).unwrap_or(0)
}

/// Kind-specific state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChallengeState {
    TimeAttack { remaining_ms: u64 },
    ShapeMaster { kinds: Vec<usize> },
    MysteryGrid { pattern: usize, hidden: Vec<(usize, usize)>, revealed: Vec<bool> },
    Cascade { streak: u32, multiplier: f64, peak: f64 },
    SpeedRun { speed_level: f64, last_placement_ms: Option<u64> },
    Zen { beauty: u32 },
    BossBattle { health: u32, weakness: usize },
}

/// Where a challenge stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    InProgress,
    Completed,
    Failed,
}

/// What the challenge sees of one placement
#[derive(Debug, Clone, Copy)]
pub struct PlacementEvent<'a> {
    pub shape: &'a Shape,
    pub row: i32,
    pub col: i32,
    pub lines: &'a CompletedLines,
    /// Board after clears
    pub grid: &'a Grid,
    pub now_ms: u64,
}

/// One day's challenge in play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChallenge {
    date: NaiveDate,
    seed: u64,
    kind: ChallengeKind,
    state: ChallengeState,
}

impl DailyChallenge {
    /// Challenge for a date (does not consult storage; see `start`)
    pub fn new(date: NaiveDate, difficulty: Difficulty) -> Self {
        let seed = date_seed(date);
        let kind = challenge_type_for(date);
        let state = match kind {
            ChallengeKind::TimeAttack => ChallengeState::TimeAttack {
                remaining_ms: TIME_ATTACK_DURATION_MS,
            },
            ChallengeKind::ShapeMaster => ChallengeState::ShapeMaster {
                kinds: pick_kinds(seed, difficulty),
            },
            ChallengeKind::MysteryGrid => {
                let pattern = (seed % MYSTERY_PATTERNS.len() as u64) as usize;
                let hidden = mystery_cells(pattern);
                let revealed = vec![false; hidden.len()];
                ChallengeState::MysteryGrid {
                    pattern,
                    hidden,
                    revealed,
                }
            }
            ChallengeKind::Cascade => ChallengeState::Cascade {
                streak: 0,
                multiplier: 1.0,
                peak: 1.0,
            },
            ChallengeKind::SpeedRun => ChallengeState::SpeedRun {
                speed_level: 1.0,
                last_placement_ms: None,
            },
            ChallengeKind::Zen => ChallengeState::Zen { beauty: 0 },
            ChallengeKind::BossBattle => ChallengeState::BossBattle {
                health: BOSS_HEALTH,
                weakness: weekly_weakness(date, difficulty),
            },
        };
        Self {
            date,
            seed,
            kind,
            state,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn kind(&self) -> ChallengeKind {
        self.kind
    }

    pub fn state(&self) -> &ChallengeState {
        &self.state
    }

    /// Shape kinds the generator is limited to, if any
    pub fn allowed_kinds(&self) -> Option<&[usize]> {
        match &self.state {
            ChallengeState::ShapeMaster { kinds } => Some(kinds),
            _ => None,
        }
    }

    /// Current score multiplier (kind bonus × mechanic bonus)
    pub fn score_multiplier(&self) -> f64 {
        let mechanic = match &self.state {
            ChallengeState::TimeAttack { remaining_ms } => {
                if *remaining_ms > 0 && *remaining_ms < URGENCY_THRESHOLD_MS {
                    URGENCY_BONUS
                } else {
                    1.0
                }
            }
            ChallengeState::Cascade { multiplier, .. } => *multiplier,
            ChallengeState::SpeedRun { speed_level, .. } => *speed_level,
            ChallengeState::Zen { beauty } => 1.0 + *beauty as f64 / 1000.0,
            ChallengeState::ShapeMaster { .. }
            | ChallengeState::MysteryGrid { .. }
            | ChallengeState::BossBattle { .. } => 1.0,
        };
        self.kind.base_multiplier() * mechanic
    }

    /// Feed a placement into the day's mechanic
    pub fn on_placement(&mut self, event: &PlacementEvent<'_>) {
        match &mut self.state {
            ChallengeState::TimeAttack { .. } | ChallengeState::ShapeMaster { .. } => {}
            ChallengeState::MysteryGrid {
                hidden, revealed, ..
            } => {
                for (dr, dc) in event.shape.pattern().blocks() {
                    let cell = (
                        (event.row + dr as i32) as usize,
                        (event.col + dc as i32) as usize,
                    );
                    if let Some(i) = hidden.iter().position(|&h| h == cell) {
                        revealed[i] = true;
                    }
                }
            }
            ChallengeState::Cascade {
                streak,
                multiplier,
                peak,
            } => {
                if event.lines.is_empty() {
                    *streak = 0;
                    *multiplier = 1.0;
                } else {
                    *streak += 1;
                    *multiplier = (1.0 + CASCADE_STEP * *streak as f64).min(CASCADE_MAX);
                    *peak = peak.max(*multiplier);
                }
            }
            ChallengeState::SpeedRun {
                speed_level,
                last_placement_ms,
            } => {
                if let Some(last) = *last_placement_ms {
                    if event.now_ms.saturating_sub(last) <= SPEED_WINDOW_MS {
                        *speed_level = (*speed_level + SPEED_STEP).min(SPEED_MAX);
                    }
                }
                *last_placement_ms = Some(event.now_ms);
            }
            ChallengeState::Zen { beauty } => {
                *beauty += pattern_beauty(event.grid);
            }
            ChallengeState::BossBattle { health, weakness } => {
                if *health > 0 && *event.shape.pattern() == catalog::pattern(*weakness) {
                    *health = health.saturating_sub(BOSS_DAMAGE);
                    log::info!("Boss hit! {} health left", health);
                }
            }
        }
    }

    /// Run the Time-Attack countdown; other kinds ignore time
    pub fn advance(&mut self, delta_ms: u64) {
        if let ChallengeState::TimeAttack { remaining_ms } = &mut self.state {
            *remaining_ms = remaining_ms.saturating_sub(delta_ms);
        }
    }

    /// Countdown left (Time-Attack only)
    pub fn time_remaining_ms(&self) -> Option<u64> {
        match self.state {
            ChallengeState::TimeAttack { remaining_ms } => Some(remaining_ms),
            _ => None,
        }
    }

    /// Challenge ended on its own terms (time up, boss down)
    pub fn is_finished(&self) -> bool {
        match self.state {
            ChallengeState::TimeAttack { remaining_ms } => remaining_ms == 0,
            ChallengeState::BossBattle { health, .. } => health == 0,
            _ => false,
        }
    }

    /// Outcome so far given the current score
    pub fn status(&self, score: u64) -> ChallengeStatus {
        match self.state {
            ChallengeState::TimeAttack { remaining_ms: 0 } if score < TIME_ATTACK_TARGET => {
                ChallengeStatus::Failed
            }
            ChallengeState::TimeAttack { remaining_ms: 0 } => ChallengeStatus::Completed,
            ChallengeState::BossBattle { health: 0, .. } => ChallengeStatus::Completed,
            _ => ChallengeStatus::InProgress,
        }
    }

    /// Whether a run ending at `score` may be recorded as complete
    pub fn can_complete(&self, score: u64) -> bool {
        match self.state {
            ChallengeState::TimeAttack { .. } => score >= TIME_ATTACK_TARGET,
            _ => true,
        }
    }

    /// Kind-specific "perfect run" condition
    pub fn is_perfect(&self, score: u64) -> bool {
        match &self.state {
            ChallengeState::TimeAttack { remaining_ms } => {
                score >= TIME_ATTACK_TARGET && *remaining_ms > 60_000
            }
            ChallengeState::ShapeMaster { .. } => score >= 5_000,
            ChallengeState::MysteryGrid { revealed, .. } => revealed.iter().all(|&r| r),
            ChallengeState::Cascade { peak, .. } => *peak >= 5.0,
            ChallengeState::SpeedRun { speed_level, .. } => *speed_level >= 3.0,
            ChallengeState::Zen { beauty } => *beauty > 500,
            ChallengeState::BossBattle { health, .. } => *health == 0,
        }
    }
}

/// Seeded choice of distinct kinds from the difficulty catalog
fn pick_kinds(seed: u64, difficulty: Difficulty) -> Vec<usize> {
    let mut pool: Vec<usize> = Catalog::for_difficulty(difficulty).kinds().collect();
    let mut lcg = Lcg::new(seed);
    // Partial Fisher-Yates
    for i in 0..SHAPE_MASTER_KINDS.min(pool.len()) {
        let j = i + lcg.next_index(pool.len() - i);
        pool.swap(i, j);
    }
    pool.truncate(SHAPE_MASTER_KINDS);
    pool
}

/// Symmetry score of a board: mirror symmetry in each axis, plus a bonus
/// when at least half the diagonal cells are filled. Empty boards score 0.
pub fn pattern_beauty(grid: &Grid) -> u32 {
    if grid.is_empty() {
        return 0;
    }
    let occ = grid.occupancy();
    let n = GRID_SIZE;
    let mut beauty = 0;

    let left_right = (0..n).all(|r| (0..n / 2).all(|c| occ[r][c] == occ[r][n - 1 - c]));
    if left_right {
        beauty += ZEN_MIRROR_BONUS;
    }
    let top_bottom = (0..n / 2).all(|r| (0..n).all(|c| occ[r][c] == occ[n - 1 - r][c]));
    if top_bottom {
        beauty += ZEN_MIRROR_BONUS;
    }
    let diagonal_filled = (0..n).filter(|&i| occ[i][i]).count() + (0..n).filter(|&i| occ[i][n - 1 - i]).count();
    if diagonal_filled >= n {
        beauty += ZEN_DIAGONAL_BONUS;
    }
    beauty
}

/// Why a daily challenge could not be started or recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DailyError {
    #[error("daily challenge {0} already completed")]
    AlreadyCompleted(u64),
    #[error("daily challenge not won")]
    NotWon,
    #[error("daily challenge {0} could not be saved")]
    NotRecorded(u64),
}

/// Per-day run statistics stored with the completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyStats {
    pub lines_cleared: u32,
    pub max_combo: u32,
    pub placements: u32,
}

/// Stored completion for one date seed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyRecord {
    pub completed: bool,
    pub score: u64,
    pub completed_at: u64,
    pub stats: DailyStats,
}

/// Consecutive-day completion streak
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyStreak {
    /// `num_days_from_ce` of the last completed date
    pub last_day: Option<i32>,
    pub current: u32,
    pub best: u32,
}

impl DailyStreak {
    pub const STORAGE_KEY: &'static str = "blockfit_daily_streak";

    /// Extend or restart the streak for a completion on `date`
    pub fn record(&mut self, date: NaiveDate) {
        let day = date.num_days_from_ce();
        self.current = match self.last_day {
            Some(last) if last == day => self.current,
            Some(last) if last + 1 == day => self.current + 1,
            _ => 1,
        };
        self.last_day = Some(day);
        self.best = self.best.max(self.current);
    }
}

/// Coins paid out for a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRewards {
    pub base: u64,
    pub type_bonus: u64,
    pub streak_bonus: u64,
    pub perfect_bonus: u64,
    pub total: u64,
    pub streak: u32,
}

/// Extra reward for harder kinds: 100 × (multiplier − 1), rounded to
/// absorb float error (1.4 − 1.0 is 0.39999...)
pub fn type_bonus(kind: ChallengeKind) -> u64 {
    (BASE_REWARD as f64 * (kind.base_multiplier() - 1.0)).round().max(0.0) as u64
}

pub fn record_key(seed: u64) -> String {
    format!("blockfit_daily_{seed}")
}

/// Completion record for a date seed, if any
pub fn load_record(store: &dyn Storage, seed: u64) -> Option<DailyRecord> {
    persistence::load_opt(store, &record_key(seed))
}

pub fn is_completed(store: &dyn Storage, seed: u64) -> bool {
    load_record(store, seed).map(|r| r.completed).unwrap_or(false)
}

/// Begin the challenge for `date` unless it was already completed
pub fn start(store: &dyn Storage, date: NaiveDate, difficulty: Difficulty) -> Result<DailyChallenge, DailyError> {
    let seed = date_seed(date);
    if is_completed(store, seed) {
        return Err(DailyError::AlreadyCompleted(seed));
    }
    let challenge = DailyChallenge::new(date, difficulty);
    log::info!(
        "Daily challenge {} ({}) started",
        seed,
        challenge.kind().as_str()
    );
    Ok(challenge)
}

/// Record a finished run and compute its rewards (once per date).
/// No rewards are paid when the completion record cannot be written, so an
/// unrecorded day cannot be cashed in twice.
pub fn complete(
    store: &mut dyn Storage,
    challenge: &DailyChallenge,
    score: u64,
    stats: DailyStats,
    now_ms: u64,
) -> Result<DailyRewards, DailyError> {
    let seed = challenge.seed();
    if is_completed(store, seed) {
        return Err(DailyError::AlreadyCompleted(seed));
    }
    if !challenge.can_complete(score) {
        return Err(DailyError::NotWon);
    }

    let record = DailyRecord {
        completed: true,
        score,
        completed_at: now_ms,
        stats,
    };
    if !persistence::save(store, &record_key(seed), &record) {
        log::warn!("Daily challenge {} completion not saved; no rewards", seed);
        return Err(DailyError::NotRecorded(seed));
    }

    let mut streak: DailyStreak = persistence::load(store, DailyStreak::STORAGE_KEY);
    streak.record(challenge.date());
    persistence::save(store, DailyStreak::STORAGE_KEY, &streak);

    let type_bonus = type_bonus(challenge.kind());
    let streak_bonus = (STREAK_BONUS_PER_DAY * streak.current as u64).min(STREAK_BONUS_CAP);
    let perfect_bonus = if challenge.is_perfect(score) {
        PERFECT_BONUS
    } else {
        0
    };
    let rewards = DailyRewards {
        base: BASE_REWARD,
        type_bonus,
        streak_bonus,
        perfect_bonus,
        total: BASE_REWARD + type_bonus + streak_bonus + perfect_bonus,
        streak: streak.current,
    };
    log::info!(
        "Daily challenge {} complete: score {}, reward {} coins (streak {})",
        seed,
        score,
        rewards.total,
        streak.current
    );
    Ok(rewards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use crate::sim::shape::Pattern;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn shape_of(kind: usize) -> Shape {
        Shape::new(1, kind, catalog::pattern(kind), 1)
    }

    fn event<'a>(shape: &'a Shape, lines: &'a CompletedLines, grid: &'a Grid, now_ms: u64) -> PlacementEvent<'a> {
        PlacementEvent {
            shape,
            row: 0,
            col: 0,
            lines,
            grid,
            now_ms,
        }
    }

    #[test]
    fn test_seed_and_weekday_mapping() {
        let d = date(2025, 1, 15);
        assert_eq!(date_seed(d), 20250115);
        assert_eq!(challenge_type_for(d), ChallengeKind::MysteryGrid);
        // One full week covers all seven kinds
        let kinds: std::collections::HashSet<_> = (12..19).map(|day| challenge_type_for(date(2025, 1, day))).collect();
        assert_eq!(kinds.len(), 7);
        assert_eq!(challenge_type_for(date(2025, 1, 12)), ChallengeKind::Zen);
        assert_eq!(challenge_type_for(date(2025, 1, 18)), ChallengeKind::BossBattle);
    }

    #[test]
    fn test_time_attack_countdown_and_urgency() {
        let mut c = DailyChallenge::new(date(2025, 1, 13), Difficulty::Easy);
        assert_eq!(c.kind(), ChallengeKind::TimeAttack);
        assert_eq!(c.score_multiplier(), 1.5);
        c.advance(155_000);
        assert_eq!(c.time_remaining_ms(), Some(25_000));
        assert_eq!(c.score_multiplier(), 3.0);
        assert_eq!(c.status(10_000), ChallengeStatus::InProgress);
        c.advance(60_000);
        assert!(c.is_finished());
        assert_eq!(c.status(100), ChallengeStatus::Failed);
        assert_eq!(c.status(TIME_ATTACK_TARGET), ChallengeStatus::Completed);
        assert_eq!(c.score_multiplier(), 1.5);
    }

    #[test]
    fn test_shape_master_kinds_seeded_and_distinct() {
        let a = DailyChallenge::new(date(2025, 1, 14), Difficulty::Hard);
        let b = DailyChallenge::new(date(2025, 1, 14), Difficulty::Hard);
        let kinds = a.allowed_kinds().unwrap();
        assert_eq!(kinds.len(), SHAPE_MASTER_KINDS);
        assert_eq!(Some(kinds), b.allowed_kinds());
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), SHAPE_MASTER_KINDS);
    }

    #[test]
    fn test_mystery_pattern_from_seed() {
        let c = DailyChallenge::new(date(2025, 1, 15), Difficulty::Easy);
        match c.state() {
            ChallengeState::MysteryGrid { pattern, hidden, .. } => {
                assert_eq!(*pattern, (20250115 % MYSTERY_PATTERNS.len() as u64) as usize);
                assert!(!hidden.is_empty());
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_mystery_reveal() {
        let mut c = DailyChallenge::new(date(2025, 1, 15), Difficulty::Easy);
        let grid = Grid::new();
        let lines = CompletedLines::default();
        let hidden = match c.state() {
            ChallengeState::MysteryGrid { hidden, .. } => hidden.clone(),
            _ => unreachable!(),
        };
        let single = shape_of(0);
        assert!(!c.is_perfect(0));
        for (r, col) in hidden {
            c.on_placement(&PlacementEvent {
                shape: &single,
                row: r as i32,
                col: col as i32,
                lines: &lines,
                grid: &grid,
                now_ms: 0,
            });
        }
        assert!(c.is_perfect(0));
    }

    #[test]
    fn test_cascade_grows_caps_and_resets() {
        let mut c = DailyChallenge::new(date(2025, 1, 16), Difficulty::Easy);
        let grid = Grid::new();
        let s = shape_of(0);
        let hit = CompletedLines {
            rows: vec![0],
            cols: vec![],
        };
        let miss = CompletedLines::default();
        for _ in 0..30 {
            c.on_placement(&event(&s, &hit, &grid, 0));
        }
        assert!((c.score_multiplier() - 1.2 * CASCADE_MAX).abs() < 1e-9);
        c.on_placement(&event(&s, &miss, &grid, 0));
        assert!((c.score_multiplier() - 1.2).abs() < 1e-9);
        assert!(c.is_perfect(0), "peak is remembered");
    }

    #[test]
    fn test_speed_run_levels() {
        let mut c = DailyChallenge::new(date(2025, 1, 17), Difficulty::Easy);
        let grid = Grid::new();
        let lines = CompletedLines::default();
        let s = shape_of(0);
        c.on_placement(&event(&s, &lines, &grid, 0));
        c.on_placement(&event(&s, &lines, &grid, 1_500));
        c.on_placement(&event(&s, &lines, &grid, 3_500));
        c.on_placement(&event(&s, &lines, &grid, 10_000));
        match c.state() {
            ChallengeState::SpeedRun { speed_level, .. } => assert!((speed_level - 1.2).abs() < 1e-9),
            _ => unreachable!(),
        }
        let mut now = 10_000;
        for _ in 0..100 {
            now += 100;
            c.on_placement(&event(&s, &lines, &grid, now));
        }
        assert!((c.score_multiplier() - 1.6 * SPEED_MAX).abs() < 1e-9);
    }

    #[test]
    fn test_pattern_beauty() {
        assert_eq!(pattern_beauty(&Grid::new()), 0);

        let mut grid = Grid::new();
        // Four corners: symmetric both ways, diagonals 4/20 filled
        for (r, c) in [(0, 0), (0, 9), (9, 0), (9, 9)] {
            grid.place(&Pattern::literal(&[&[1]]), r, c, 1).unwrap();
        }
        assert_eq!(pattern_beauty(&grid), 100);

        let mut diag = Grid::new();
        for i in 0..GRID_SIZE as i32 {
            diag.place(&Pattern::literal(&[&[1]]), i, i, 1).unwrap();
        }
        // Main diagonal alone: neither mirror holds, 10 diagonal cells
        assert_eq!(pattern_beauty(&diag), ZEN_DIAGONAL_BONUS);
    }

    #[test]
    fn test_zen_multiplier_accumulates() {
        let mut c = DailyChallenge::new(date(2025, 1, 12), Difficulty::Easy);
        let mut grid = Grid::new();
        grid.place(&Pattern::literal(&[&[1, 1], &[1, 1]]), 4, 4, 2).unwrap();
        let lines = CompletedLines::default();
        let s = shape_of(9);
        for _ in 0..6 {
            c.on_placement(&event(&s, &lines, &grid, 0));
        }
        // Centred square: +100 per placement
        assert!((c.score_multiplier() - 1.6).abs() < 1e-9);
        assert!(c.is_perfect(0));
    }

    #[test]
    fn test_boss_takes_damage_only_from_weakness() {
        let d = date(2025, 1, 18);
        let mut c = DailyChallenge::new(d, Difficulty::Hard);
        let weakness = weekly_weakness(d, Difficulty::Hard);
        let grid = Grid::new();
        let lines = CompletedLines::default();
        let other = shape_of((weakness + 1) % catalog::kind_count());
        c.on_placement(&event(&other, &lines, &grid, 0));
        assert_eq!(c.state(), &ChallengeState::BossBattle { health: BOSS_HEALTH, weakness });

        let hit = shape_of(weakness);
        for _ in 0..10 {
            assert!(!c.is_finished());
            c.on_placement(&event(&hit, &lines, &grid, 0));
        }
        assert!(c.is_finished());
        assert_eq!(c.status(0), ChallengeStatus::Completed);
        assert!(c.is_perfect(0));
    }

    #[test]
    fn test_weakness_changes_weekly() {
        let a = weekly_weakness(date(2025, 1, 18), Difficulty::Hard);
        let b = weekly_weakness(date(2025, 1, 25), Difficulty::Hard);
        assert_eq!((a + 1) % catalog::kind_count(), b);
    }

    #[test]
    fn test_easy_weakness_is_drawable() {
        let easy = Catalog::for_difficulty(Difficulty::Easy);
        let mut day = date(2025, 1, 18);
        for _ in 0..52 {
            let weakness = weekly_weakness(day, Difficulty::Easy);
            assert!(easy.kinds().any(|k| k == weakness), "week of {} gave {}", day, weakness);
            match DailyChallenge::new(day, Difficulty::Easy).state() {
                ChallengeState::BossBattle { weakness: w, .. } => assert_eq!(*w, weakness),
                other => panic!("expected boss battle, got {:?}", other),
            }
            day = day + chrono::Duration::days(7);
        }
    }

    #[test]
    fn test_completion_recorded_once() {
        let mut store = MemoryStorage::new();
        let d = date(2025, 1, 12);
        let c = start(&store, d, Difficulty::Easy).unwrap();
        assert!(!is_completed(&store, c.seed()));

        let rewards = complete(&mut store, &c, 1234, DailyStats::default(), 42).unwrap();
        assert_eq!(rewards.base, BASE_REWARD);
        assert_eq!(rewards.streak, 1);
        assert_eq!(rewards.streak_bonus, 20);

        for _ in 0..3 {
            assert!(is_completed(&store, c.seed()));
        }
        assert_eq!(
            start(&store, d, Difficulty::Easy),
            Err(DailyError::AlreadyCompleted(20250112))
        );
        assert_eq!(
            complete(&mut store, &c, 9999, DailyStats::default(), 43),
            Err(DailyError::AlreadyCompleted(20250112))
        );
        let record = load_record(&store, c.seed()).unwrap();
        assert_eq!(record.score, 1234);
        assert_eq!(record.completed_at, 42);
    }

    #[test]
    fn test_failed_time_attack_not_recorded() {
        let mut store = MemoryStorage::new();
        let mut c = start(&store, date(2025, 1, 13), Difficulty::Easy).unwrap();
        c.advance(TIME_ATTACK_DURATION_MS);
        assert_eq!(
            complete(&mut store, &c, 10, DailyStats::default(), 0),
            Err(DailyError::NotWon)
        );
        assert!(!is_completed(&store, c.seed()));
    }

    #[test]
    fn test_streak_and_rewards() {
        let mut store = MemoryStorage::new();
        let mut last = DailyRewards::default();
        for day in 12..=18 {
            let c = start(&store, date(2025, 1, day), Difficulty::Easy).unwrap();
            last = complete(&mut store, &c, TIME_ATTACK_TARGET, DailyStats::default(), 0).unwrap();
        }
        // Saturday boss, not defeated: 100 + 100 type + 7*20 streak
        assert_eq!(last.streak, 7);
        assert_eq!(last.type_bonus, 100);
        assert_eq!(last.streak_bonus, 140);
        assert_eq!(last.perfect_bonus, 0);
        assert_eq!(last.total, 340);

        // A gap restarts the streak
        let c = start(&store, date(2025, 1, 21), Difficulty::Easy).unwrap();
        let r = complete(&mut store, &c, 0, DailyStats::default(), 0).unwrap();
        assert_eq!(r.streak, 1);
        let streak: DailyStreak = persistence::load(&store, DailyStreak::STORAGE_KEY);
        assert_eq!(streak.best, 7);
    }

    #[test]
    fn test_type_bonus_per_kind() {
        assert_eq!(type_bonus(ChallengeKind::Zen), 0);
        assert_eq!(type_bonus(ChallengeKind::Cascade), 20);
        assert_eq!(type_bonus(ChallengeKind::MysteryGrid), 40);
        assert_eq!(type_bonus(ChallengeKind::SpeedRun), 60);
        assert_eq!(type_bonus(ChallengeKind::BossBattle), 100);
    }

    #[test]
    fn test_streak_bonus_capped() {
        let mut store = MemoryStorage::new();
        let start_day = date(2025, 1, 1);
        let mut last = None;
        for i in 0..30 {
            let day = start_day + chrono::Days::new(i);
            let challenge = start(&store, day, Difficulty::Easy).unwrap();
            // Score clears the Time-Attack target; other kinds accept any score
            let rewards = complete(&mut store, &challenge, 1_000_000, DailyStats::default(), 0).unwrap();
            assert_eq!(rewards.streak, i as u32 + 1);
            assert_eq!(rewards.streak_bonus, (STREAK_BONUS_PER_DAY * (i + 1)).min(STREAK_BONUS_CAP));
            last = Some(rewards);
        }
        let last = last.unwrap();
        assert_eq!(last.streak, 30);
        assert_eq!(last.streak_bonus, STREAK_BONUS_CAP);
        assert_eq!(STREAK_BONUS_CAP, 500);
    }

    #[test]
    fn test_unsaved_completion_pays_nothing() {
        let mut store = MemoryStorage::new();
        let d = date(2025, 1, 12);
        let challenge = start(&store, d, Difficulty::Easy).unwrap();
        store.set_read_only(true);
        assert_eq!(
            complete(&mut store, &challenge, 100, DailyStats::default(), 0),
            Err(DailyError::NotRecorded(20250112))
        );
        assert!(!is_completed(&store, 20250112));

        store.set_read_only(false);
        assert!(complete(&mut store, &challenge, 100, DailyStats::default(), 0).is_ok());
        assert!(is_completed(&store, 20250112));
    }
}
