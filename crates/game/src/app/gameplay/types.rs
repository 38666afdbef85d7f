#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct EntityId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Facing {
    Left,
    Right,
}

impl Facing {
    fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Player life phases. Dying and Dancing both suppress input; a tick
/// timer decides when either phase hands control back to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifeState {
    Alive,
    Dying,
    Dancing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnemyState {
    Walking,
    Squashed,
}

struct Enemy {
    id: EntityId,
    body: BodyId,
    state: EnemyState,
    walk_velocity: f32,
}

struct BoxEntity {
    id: EntityId,
    body: BodyId,
    content: BoxContent,
    used: bool,
}

struct Brick {
    id: EntityId,
    body: BodyId,
}

/// A flower stays Emerging (disabled body, no pickup) until its rise
/// timer fires; mushrooms and stars spawn Active and walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectibleState {
    Emerging,
    Active,
}

struct Collectible {
    id: EntityId,
    body: BodyId,
    effect: CollectibleEffect,
    points: u32,
    state: CollectibleState,
}

#[derive(Debug, Clone, PartialEq)]
enum PortalTarget {
    Level {
        direction: PortalDirection,
        destination: String,
        spawn: SpawnPoint,
    },
    Exit,
}

struct Portal {
    id: EntityId,
    body: BodyId,
    target: PortalTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlatformAxis {
    Horizontal,
    Vertical,
}

struct Platform {
    id: EntityId,
    body: BodyId,
    axis: PlatformAxis,
    origin_x: f32,
    origin_y: f32,
    forward: bool,
}

struct Princess {
    id: EntityId,
    body: BodyId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    ExpireBullet,
    RemoveEnemy(EntityId),
    ActivateFlower(EntityId),
    FinishDance,
    FinishDeath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplayEvent {
    EnemyStomped { enemy_id: EntityId },
    EnemyShot { enemy_id: EntityId },
    PlayerDamaged,
    PlayerRevived { lives_left: u32 },
    PlayerDied,
    BoxOpened { content: BoxContent },
    CollectiblePicked { effect: CollectibleEffect },
    PortalEntered,
    DanceStarted,
    LevelExited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameplayEventKind {
    EnemyStomped,
    EnemyShot,
    PlayerDamaged,
    PlayerRevived,
    PlayerDied,
    BoxOpened,
    CollectiblePicked,
    PortalEntered,
    DanceStarted,
    LevelExited,
}

impl GameplayEvent {
    fn kind(self) -> GameplayEventKind {
        match self {
            Self::EnemyStomped { .. } => GameplayEventKind::EnemyStomped,
            Self::EnemyShot { .. } => GameplayEventKind::EnemyShot,
            Self::PlayerDamaged => GameplayEventKind::PlayerDamaged,
            Self::PlayerRevived { .. } => GameplayEventKind::PlayerRevived,
            Self::PlayerDied => GameplayEventKind::PlayerDied,
            Self::BoxOpened { .. } => GameplayEventKind::BoxOpened,
            Self::CollectiblePicked { .. } => GameplayEventKind::CollectiblePicked,
            Self::PortalEntered => GameplayEventKind::PortalEntered,
            Self::DanceStarted => GameplayEventKind::DanceStarted,
            Self::LevelExited => GameplayEventKind::LevelExited,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GameplayEventCounts {
    total: u32,
    enemy_stomped: u32,
    enemy_shot: u32,
    player_damaged: u32,
    player_revived: u32,
    player_died: u32,
    box_opened: u32,
    collectible_picked: u32,
    portal_entered: u32,
    dance_started: u32,
    level_exited: u32,
}

impl GameplayEventCounts {
    fn record(&mut self, kind: GameplayEventKind) {
        self.total = self.total.saturating_add(1);
        match kind {
            GameplayEventKind::EnemyStomped => {
                self.enemy_stomped = self.enemy_stomped.saturating_add(1)
            }
            GameplayEventKind::EnemyShot => self.enemy_shot = self.enemy_shot.saturating_add(1),
            GameplayEventKind::PlayerDamaged => {
                self.player_damaged = self.player_damaged.saturating_add(1)
            }
            GameplayEventKind::PlayerRevived => {
                self.player_revived = self.player_revived.saturating_add(1)
            }
            GameplayEventKind::PlayerDied => self.player_died = self.player_died.saturating_add(1),
            GameplayEventKind::BoxOpened => self.box_opened = self.box_opened.saturating_add(1),
            GameplayEventKind::CollectiblePicked => {
                self.collectible_picked = self.collectible_picked.saturating_add(1)
            }
            GameplayEventKind::PortalEntered => {
                self.portal_entered = self.portal_entered.saturating_add(1)
            }
            GameplayEventKind::DanceStarted => {
                self.dance_started = self.dance_started.saturating_add(1)
            }
            GameplayEventKind::LevelExited => {
                self.level_exited = self.level_exited.saturating_add(1)
            }
        }
    }
}

#[derive(Default)]
struct GameplayEventBus {
    current_tick_events: Vec<GameplayEvent>,
    last_tick_counts: GameplayEventCounts,
}

impl GameplayEventBus {
    fn emit(&mut self, event: GameplayEvent) {
        self.current_tick_events.push(event);
    }

    fn finish_tick_rollover(&mut self) {
        let mut counts = GameplayEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.current_tick_events.clear();
    }

    fn last_tick_counts(&self) -> GameplayEventCounts {
        self.last_tick_counts
    }

    fn clear(&mut self) {
        self.current_tick_events.clear();
        self.last_tick_counts = GameplayEventCounts::default();
    }
}

/// Cosmetic effects for an external renderer. Nothing in the sim reads
/// these back; they are drained at the end of every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EffectKind {
    BoxBounce,
    CoinRise,
    ContentReveal,
    EnemyFade,
    StompHop,
    DeathLeap,
    DanceSway,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PresentationEffect {
    kind: EffectKind,
    x: f32,
    y: f32,
}

#[derive(Default)]
struct EffectQueue {
    queued: Vec<PresentationEffect>,
}

impl EffectQueue {
    fn emit(&mut self, kind: EffectKind, x: f32, y: f32) {
        self.queued.push(PresentationEffect { kind, x, y });
    }

    fn drain(&mut self) -> Vec<PresentationEffect> {
        std::mem::take(&mut self.queued)
    }
}
