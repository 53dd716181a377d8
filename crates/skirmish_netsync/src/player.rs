//! Аватары игроков: authoritative состояние, owner requests, field sync
//!
//! Владелец аватара НЕ меняет свои поля напрямую: он шлёт `OwnerRequest`,
//! сервер валидирует и применяет их тем же путём, что и для AI, а потом
//! публикует изменившиеся поля всем наблюдателям.
//!
//! `PlayerRoster` — `TargetRegistry` для симуляции: AI видит живых игроков
//! как цели.

use crate::protocol::{
    ClientMessage, FieldChange, FieldId, FieldValue, NetEntity, NetError, NetResult,
    OwnerRequest, ServerMessage,
};
use crate::sync_var::SyncVar;
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_simulation::combat::{DispatchStatus, FireDispatcher};
use skirmish_simulation::{
    normalize_degrees, Health, ProjectileSystem, Shooter, ShotRequest, TargetHandle,
    TargetRegistry,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Параметры аватара игрока
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub max_health: u32,
    pub max_ammo: u32,
    pub reload_time: f32,
    /// Минимальный интервал между выстрелами (секунды)
    pub fire_rate: f32,
    pub move_speed: f32,
    pub projectile_speed: f32,
    pub projectile_damage: u32,
    pub projectile_range: f32,
    pub max_revives: u32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            max_ammo: 30,
            reload_time: 2.0,
            fire_rate: 0.2,
            move_speed: 4.0,
            projectile_speed: 15.0,
            projectile_damage: 10,
            projectile_range: 20.0,
            max_revives: 3,
        }
    }
}

/// Authoritative состояние аватара (живёт только на сервере)
#[derive(Debug, Clone)]
pub struct PlayerAvatar {
    pub handle: TargetHandle,
    pub position: Vec2,
    pub health: Health,
    pub ammo: u32,
    pub aim_angle: f32,
    pub move_direction: Vec2,
    pub moving: bool,
    pub attacking: bool,
    pub revives_left: u32,
    reload_remaining: Option<f32>,
    last_shot_at: Option<f64>,
    dispatcher: FireDispatcher,
    config: Arc<AvatarConfig>,
}

impl PlayerAvatar {
    pub fn new(handle: TargetHandle, position: Vec2, config: Arc<AvatarConfig>) -> Self {
        Self {
            handle,
            position,
            health: Health::new(config.max_health),
            ammo: config.max_ammo,
            aim_angle: 0.0,
            move_direction: Vec2::ZERO,
            moving: false,
            attacking: false,
            revives_left: config.max_revives,
            reload_remaining: None,
            last_shot_at: None,
            dispatcher: FireDispatcher::new(),
            config,
        }
    }

    pub fn is_dead(&self) -> bool {
        !self.health.is_alive()
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_remaining.is_some()
    }

    /// 0..1 пока идёт перезарядка, 0 иначе
    pub fn reload_progress(&self) -> f32 {
        match self.reload_remaining {
            Some(remaining) if self.config.reload_time > 0.0 => {
                (1.0 - remaining / self.config.reload_time).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn pending_shots(&self) -> usize {
        self.dispatcher.pending_count()
    }

    fn fire(
        &mut self,
        angle: f32,
        origin: Vec2,
        now: f64,
        projectiles: &mut dyn ProjectileSystem,
    ) -> NetResult<()> {
        if self.is_dead() {
            return Err(NetError::rejected("dead players cannot fire"));
        }
        if self.is_reloading() {
            return Err(NetError::rejected("reloading"));
        }
        if self.ammo == 0 {
            return Err(NetError::rejected("out of ammo"));
        }
        if let Some(last) = self.last_shot_at {
            if now - last < self.config.fire_rate as f64 {
                return Err(NetError::rejected("fire rate"));
            }
        }

        let request = ShotRequest {
            owner: Shooter::Avatar(self.handle),
            origin,
            angle: normalize_degrees(angle),
            speed: self.config.projectile_speed,
            damage: self.config.projectile_damage,
            range: self.config.projectile_range,
        };
        if self.dispatcher.dispatch(request, projectiles) == DispatchStatus::Rejected {
            return Err(NetError::rejected("projectile rejected"));
        }

        self.ammo -= 1;
        self.aim_angle = request.angle;
        self.last_shot_at = Some(now);
        Ok(())
    }

    fn start_reload(&mut self) -> NetResult<()> {
        if self.is_dead() {
            return Err(NetError::rejected("dead players cannot reload"));
        }
        // Повторный запрос во время перезарядки игнорируется
        if self.is_reloading() {
            return Ok(());
        }
        self.reload_remaining = Some(self.config.reload_time);
        skirmish_simulation::log(&format!("player:{} reload started", self.handle));
        Ok(())
    }

    fn set_field(&mut self, field: FieldId, value: FieldValue) -> NetResult<()> {
        if !field.is_owner_writable() {
            return Err(NetError::rejected(format!("{:?} is server-owned", field)));
        }
        match (field, value) {
            (FieldId::AimAngle, FieldValue::Angle(angle)) => {
                self.aim_angle = normalize_degrees(angle);
                Ok(())
            }
            (FieldId::Attacking, FieldValue::Bool(attacking)) => {
                self.attacking = attacking;
                Ok(())
            }
            _ => Err(NetError::rejected(format!("bad value for {:?}", field))),
        }
    }

    fn set_movement(&mut self, direction: Vec2, moving: bool) -> NetResult<()> {
        if self.is_dead() {
            return Err(NetError::rejected("dead players cannot move"));
        }
        if !direction.is_finite() {
            return Err(NetError::rejected("non-finite move direction"));
        }
        self.move_direction = direction.normalize_or_zero();
        self.moving = moving && self.move_direction != Vec2::ZERO;
        Ok(())
    }

    fn revive(&mut self) -> NetResult<()> {
        if !self.is_dead() {
            return Err(NetError::rejected("player is alive"));
        }
        if self.revives_left == 0 {
            return Err(NetError::rejected("no revives left"));
        }
        self.revives_left -= 1;
        self.health = Health::new(self.config.max_health);
        self.ammo = self.config.max_ammo;
        self.reload_remaining = None;
        skirmish_simulation::log(&format!(
            "player:{} revived ({} left)",
            self.handle, self.revives_left
        ));
        Ok(())
    }

    /// Authoritative tick: движение, таймер перезарядки, очередь выстрелов
    fn tick(&mut self, dt: f32, projectiles: &mut dyn ProjectileSystem) {
        self.dispatcher.tick(dt, projectiles);

        if self.is_dead() {
            return;
        }

        if self.moving {
            self.position += self.move_direction * self.config.move_speed * dt;
        }

        if let Some(remaining) = self.reload_remaining.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.reload_remaining = None;
                self.ammo = self.config.max_ammo;
                skirmish_simulation::log(&format!("player:{} reload completed", self.handle));
            }
        }
    }

    /// Урон применяется только на сервере; true если удар смертельный
    fn take_damage(&mut self, amount: u32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health.take_damage(amount);
        if self.is_dead() {
            self.moving = false;
            self.attacking = false;
            self.reload_remaining = None;
            return true;
        }
        false
    }
}

/// Все аватары сессии (BTreeMap → детерминированный порядок)
#[derive(Debug, Clone, Default)]
pub struct PlayerRoster {
    avatars: BTreeMap<TargetHandle, PlayerAvatar>,
    config: Arc<AvatarConfig>,
}

impl PlayerRoster {
    pub fn new(config: AvatarConfig) -> Self {
        Self {
            avatars: BTreeMap::new(),
            config: Arc::new(config),
        }
    }

    pub fn join(&mut self, handle: TargetHandle, position: Vec2) {
        self.avatars.insert(
            handle,
            PlayerAvatar::new(handle, position, Arc::clone(&self.config)),
        );
        skirmish_simulation::log(&format!("player:{} joined", handle));
    }

    pub fn leave(&mut self, handle: TargetHandle) -> bool {
        self.avatars.remove(&handle).is_some()
    }

    pub fn get(&self, handle: TargetHandle) -> Option<&PlayerAvatar> {
        self.avatars.get(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerAvatar> {
        self.avatars.values()
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    /// None если игрока нет; Some(true) если удар смертельный
    pub fn apply_damage(&mut self, handle: TargetHandle, amount: u32) -> Option<bool> {
        let avatar = self.avatars.get_mut(&handle)?;
        let killed = avatar.take_damage(amount);
        if killed {
            skirmish_simulation::log(&format!("player:{} died", handle));
        }
        Some(killed)
    }

    /// Валидирует и применяет запрос владельца
    pub fn handle_request(
        &mut self,
        message: &ClientMessage,
        now: f64,
        projectiles: &mut dyn ProjectileSystem,
    ) -> NetResult<()> {
        let avatar = self
            .avatars
            .get_mut(&message.player)
            .ok_or(NetError::UnknownEntity(NetEntity::Player(message.player)))?;

        match message.request {
            OwnerRequest::Fire { angle, origin } => avatar.fire(angle, origin, now, projectiles),
            OwnerRequest::Reload => avatar.start_reload(),
            OwnerRequest::SetField { field, value } => avatar.set_field(field, value),
            OwnerRequest::Move { direction, moving } => avatar.set_movement(direction, moving),
            OwnerRequest::Revive => avatar.revive(),
        }
    }

    pub fn tick(&mut self, dt: f32, projectiles: &mut dyn ProjectileSystem) {
        for avatar in self.avatars.values_mut() {
            avatar.tick(dt, projectiles);
        }
    }
}

impl TargetRegistry for PlayerRoster {
    fn all_live_targets(&self) -> Vec<TargetHandle> {
        self.avatars
            .values()
            .filter(|avatar| !avatar.is_dead())
            .map(|avatar| avatar.handle)
            .collect()
    }

    fn position(&self, target: TargetHandle) -> Option<Vec2> {
        self.avatars.get(&target).map(|avatar| avatar.position)
    }

    fn is_alive(&self, target: TargetHandle) -> bool {
        self.avatars
            .get(&target)
            .is_some_and(|avatar| !avatar.is_dead())
    }
}

/// SyncVar'ы одного аватара
#[derive(Debug, Clone)]
struct AvatarVars {
    health: SyncVar<u32>,
    dead: SyncVar<bool>,
    ammo: SyncVar<u32>,
    reloading: SyncVar<bool>,
    aim_angle: SyncVar<f32>,
    position: SyncVar<Vec2>,
    move_direction: SyncVar<Vec2>,
    moving: SyncVar<bool>,
    attacking: SyncVar<bool>,
    revives_left: SyncVar<u32>,
}

impl AvatarVars {
    fn new(avatar: &PlayerAvatar) -> Self {
        Self {
            health: SyncVar::new(avatar.health.current),
            dead: SyncVar::new(avatar.is_dead()),
            ammo: SyncVar::new(avatar.ammo),
            reloading: SyncVar::new(avatar.is_reloading()),
            aim_angle: SyncVar::new(avatar.aim_angle),
            position: SyncVar::new(avatar.position),
            move_direction: SyncVar::new(avatar.move_direction),
            moving: SyncVar::new(avatar.moving),
            attacking: SyncVar::new(avatar.attacking),
            revives_left: SyncVar::new(avatar.revives_left),
        }
    }

    fn capture(&mut self, avatar: &PlayerAvatar) {
        self.health.set(avatar.health.current);
        self.dead.set(avatar.is_dead());
        self.ammo.set(avatar.ammo);
        self.reloading.set(avatar.is_reloading());
        self.aim_angle.set(avatar.aim_angle);
        self.position.set(avatar.position);
        self.move_direction.set(avatar.move_direction);
        self.moving.set(avatar.moving);
        self.attacking.set(avatar.attacking);
        self.revives_left.set(avatar.revives_left);
    }

    fn drain(&mut self, entity: NetEntity, timestamp: f64, out: &mut Vec<ServerMessage>) {
        let mut push = |field: FieldId, value: FieldValue| {
            out.push(ServerMessage::Field(FieldChange {
                entity,
                field,
                value,
                timestamp,
            }));
        };

        if let Some(value) = self.health.take_change() {
            push(FieldId::Health, FieldValue::Count(value));
        }
        if let Some(value) = self.dead.take_change() {
            push(FieldId::Dead, FieldValue::Bool(value));
        }
        if let Some(value) = self.ammo.take_change() {
            push(FieldId::Ammo, FieldValue::Count(value));
        }
        if let Some(value) = self.reloading.take_change() {
            push(FieldId::Reloading, FieldValue::Bool(value));
        }
        if let Some(value) = self.aim_angle.take_change() {
            push(FieldId::AimAngle, FieldValue::Angle(value));
        }
        if let Some(value) = self.position.take_change() {
            push(FieldId::Position, FieldValue::Vector(value));
        }
        if let Some(value) = self.move_direction.take_change() {
            push(FieldId::MoveDirection, FieldValue::Vector(value));
        }
        if let Some(value) = self.moving.take_change() {
            push(FieldId::Moving, FieldValue::Bool(value));
        }
        if let Some(value) = self.attacking.take_change() {
            push(FieldId::Attacking, FieldValue::Bool(value));
        }
        if let Some(value) = self.revives_left.take_change() {
            push(FieldId::ReviveCount, FieldValue::Count(value));
        }
    }
}

/// Field sync аватаров: только изменившиеся с прошлого publish поля
#[derive(Debug, Clone, Default)]
pub struct PlayerReplicator {
    vars: BTreeMap<TargetHandle, AvatarVars>,
}

impl PlayerReplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, roster: &PlayerRoster, timestamp: f64, out: &mut Vec<ServerMessage>) {
        for avatar in roster.iter() {
            let vars = self
                .vars
                .entry(avatar.handle)
                .or_insert_with(|| AvatarVars::new(avatar));
            vars.capture(avatar);
            vars.drain(NetEntity::Player(avatar.handle), timestamp, out);
        }

        // Ушедшие игроки
        let gone: Vec<TargetHandle> = self
            .vars
            .keys()
            .filter(|handle| roster.get(**handle).is_none())
            .copied()
            .collect();
        for handle in gone {
            self.vars.remove(&handle);
            out.push(ServerMessage::Despawned(NetEntity::Player(handle)));
        }
    }
}
