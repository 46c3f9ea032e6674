// collision.rs - Routes physics contacts to combat handlers
//
// The dispatcher is the sole writer of every table it touches while it runs,
// so events are processed one at a time without further locking. Events
// whose participants match no known signature pair are dropped.

use crate::collaborators::{ContactEvent, ContactKind, TickResources};
use crate::components::{
    AttackProfile, CooldownExpiry, DamageQueue, DestroyFlag, EnemyTag, GemTag, GemsCollected,
    PlasmaBlast, PlayerTag, UpdateGemUiFlag,
};
use survivors_core::ecs::{
    Commands, Component, Entity, System, SystemContext, SystemDescriptor, SystemError, TableMut,
    TableRef,
};
use tracing::trace;

pub struct CollisionDispatch;

struct Lookups<'w> {
    players: TableRef<'w, PlayerTag>,
    enemies: TableRef<'w, EnemyTag>,
    attacks: TableRef<'w, AttackProfile>,
    blasts: TableRef<'w, PlasmaBlast>,
    gems: TableRef<'w, GemTag>,
    cooldowns: TableMut<'w, CooldownExpiry>,
    damage: TableMut<'w, DamageQueue>,
    destroy: TableMut<'w, DestroyFlag>,
    collected: TableMut<'w, GemsCollected>,
    gem_ui: TableMut<'w, UpdateGemUiFlag>,
}

/// `Some((x, y))` when one participant satisfies `is_x` and the other
/// `is_y`, in whichever order the engine reported them.
fn orient(
    event: &ContactEvent,
    is_x: impl Fn(Entity) -> bool,
    is_y: impl Fn(Entity) -> bool,
) -> Option<(Entity, Entity)> {
    if is_x(event.a) && is_y(event.b) {
        Some((event.a, event.b))
    } else if is_x(event.b) && is_y(event.a) {
        Some((event.b, event.a))
    } else {
        None
    }
}

impl Lookups<'_> {
    fn dispatch(&mut self, event: &ContactEvent, now: f64) {
        match event.kind {
            ContactKind::Collision => {
                let hit = orient(
                    event,
                    |e| self.players.contains(e),
                    |e| self.enemies.contains(e) && self.attacks.contains(e),
                );
                if let Some((player, enemy)) = hit {
                    self.enemy_contact(player, enemy, now);
                }
            }
            ContactKind::Trigger => {
                let projectile = orient(
                    event,
                    |e| self.blasts.contains(e),
                    |e| self.enemies.contains(e),
                );
                if let Some((blast, enemy)) = projectile {
                    self.projectile_hit(blast, enemy);
                    return;
                }
                let pickup = orient(
                    event,
                    |e| self.gems.contains(e),
                    |e| self.collected.contains(e),
                );
                if let Some((gem, player)) = pickup {
                    self.pickup(gem, player);
                }
            }
        }
    }

    fn enemy_contact(&mut self, player: Entity, enemy: Entity, now: f64) {
        if self.cooldowns.is_enabled(enemy) {
            return;
        }
        let Some(attack) = self.attacks.get(enemy).copied() else {
            return;
        };
        let Some(cooldown) = self.cooldowns.get_mut(enemy) else {
            return;
        };
        cooldown.expires_at = now + f64::from(attack.cooldown);
        self.cooldowns.set_enabled(enemy, true);
        if let Some(queue) = self.damage.get_mut(player) {
            queue.push(attack.damage);
        }
        trace!(%enemy, %player, damage = attack.damage, "enemy contact");
    }

    fn projectile_hit(&mut self, blast: Entity, enemy: Entity) {
        // A spent projectile may still overlap other enemies this tick.
        if self.destroy.is_enabled(blast) {
            return;
        }
        let Some(damage) = self.blasts.get(blast).map(|b| b.damage) else {
            return;
        };
        if let Some(queue) = self.damage.get_mut(enemy) {
            queue.push(damage);
        }
        self.destroy.set_enabled(blast, true);
        trace!(%blast, %enemy, damage, "projectile hit");
    }

    fn pickup(&mut self, gem: Entity, player: Entity) {
        if self.destroy.is_enabled(gem) {
            return;
        }
        if let Some(count) = self.collected.get_mut(player) {
            count.0 += 1;
        }
        self.gem_ui.set_enabled(player, true);
        self.destroy.set_enabled(gem, true);
        trace!(%gem, %player, "gem collected");
    }
}

impl System<TickResources> for CollisionDispatch {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("collision_dispatch")
            .reads([
                PlayerTag::ID,
                EnemyTag::ID,
                AttackProfile::ID,
                PlasmaBlast::ID,
                GemTag::ID,
            ])
            .writes([
                CooldownExpiry::ID,
                DamageQueue::ID,
                DestroyFlag::ID,
                GemsCollected::ID,
                UpdateGemUiFlag::ID,
            ])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let events = &ctx.resources().events;
        if events.is_empty() {
            return Ok(());
        }
        let mut lookups = Lookups {
            players: ctx.read()?,
            enemies: ctx.read()?,
            attacks: ctx.read()?,
            blasts: ctx.read()?,
            gems: ctx.read()?,
            cooldowns: ctx.write()?,
            damage: ctx.write()?,
            destroy: ctx.write()?,
            collected: ctx.write()?,
            gem_ui: ctx.write()?,
        };
        let now = ctx.time().elapsed;
        for event in events {
            lookups.dispatch(event, now);
        }
        Ok(())
    }
}
