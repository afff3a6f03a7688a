/// CollisionResolver: shallow-axis overlap resolution for the player.
///
/// ## One obstacle
///
/// ```text
///   depth == 0                          → Clear
///   |dy| < |dx|  or  surface=Platform   → vertical branch
///       from_above = previous_bottom <= obstacle.top
///       surface       | from_above            | otherwise
///       --------------|-----------------------|-----------
///       Impassable    | land + push           | push (head bump)
///       Platform      | land + push           | pass through
///       Passable      | land + push           | pass through
///       Ladder (top)  | land + push unless    | pass through
///                     | climbing or jumping   |
///   else                                → horizontal branch
///       Impassable pushes, everything else passes through
/// ```
///
/// Ladder cells that are not the top of their column never reach
/// `resolve`; the tile pass skips them.
///
/// ## One frame (`resolve_frame`)
///
/// Order: movable tiles → wall tiles → live enemies → grid cells in the
/// range the (possibly already moved) bounds cover. Contact flags for
/// actors are measured on the bounds *before* that actor is resolved.
///
/// Positions carry sub-pixel motion while bounds are whole pixels, so a
/// slow fall can leave the feet touching a surface without sinking into
/// it. When no pass landed and the body is not rising, feet resting
/// exactly on a landable top still count as grounded.

use glam::Vec2;

use crate::domain::actor::{Enemy, MovableTile, Obstacle, WallTile};
use crate::domain::geometry::Rect;
use crate::domain::map::TileCollisionMap;
use crate::domain::tile::TileCollision;

/// The resolvable part of the player: a bottom-centered box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub width: i32,
    pub height: i32,
    /// Bottom edge at the end of the previous frame.
    pub previous_bottom: i32,
}

impl Body {
    pub fn bounds(&self) -> Rect {
        Rect::from_bottom_center(self.position, self.width, self.height)
    }
}

/// Movement modes that change how ladders behave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stance {
    pub climbing: bool,
    pub jumping: bool,
    pub thrusting_down: bool,
    /// Moving upward this frame; nothing can be stood on.
    pub rising: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    Clear,
    /// Pushed up onto the obstacle's top edge.
    Landed,
    Blocked(Axis),
    PassedThrough,
}

/// Resolve `body` against one obstacle, moving it out along the shallow axis.
pub fn resolve(body: &mut Body, obstacle: &Rect, surface: TileCollision, stance: Stance) -> Contact {
    let depth = body.bounds().intersection_depth(obstacle);
    if depth == Vec2::ZERO {
        return Contact::Clear;
    }

    if depth.y.abs() < depth.x.abs() || surface.prefers_vertical() {
        let lands = lands_on(surface, stance, body.previous_bottom <= obstacle.top);

        if lands || surface == TileCollision::Impassable {
            // Depth is measured on rounded bounds; push from the rounded
            // position so the edge ends exactly on the obstacle's.
            body.position.y = body.position.y.round() + depth.y;
            if lands {
                Contact::Landed
            } else {
                Contact::Blocked(Axis::Vertical)
            }
        } else {
            Contact::PassedThrough
        }
    } else if surface.blocks_sideways() {
        body.position.x = body.position.x.round() + depth.x;
        Contact::Blocked(Axis::Horizontal)
    } else {
        Contact::PassedThrough
    }
}

/// Read-only view of everything the player collides with.
#[derive(Clone, Copy)]
pub struct Surroundings<'a> {
    pub map: &'a TileCollisionMap,
    pub movable_tiles: &'a [MovableTile],
    pub wall_tiles: &'a [WallTile],
    pub enemies: &'a [Enemy],
}

/// Result of one frame's collision pass. Indices refer to the slices
/// in `Surroundings`; the orchestrator turns them into actor flags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contacts {
    pub grounded: bool,
    /// Landed on something that ends a climb or jump (anything but a ladder top).
    pub landed_solid: bool,
    /// A push-out stopped motion along this axis.
    pub blocked_x: bool,
    pub blocked_y: bool,
    pub riding: Vec<usize>,
    pub walls: Vec<usize>,
    pub enemies_under: Vec<usize>,
    pub enemies_stomped: Vec<usize>,
}

fn lands_on(surface: TileCollision, stance: Stance, from_above: bool) -> bool {
    from_above
        && match surface {
            TileCollision::Ladder => !stance.climbing && !stance.jumping,
            _ => true,
        }
}

/// Feet exactly on the top edge of a landable `obstacle`, overlapping it
/// horizontally.
fn rests_on(body: &Body, obstacle: &Rect, surface: TileCollision, stance: Stance) -> bool {
    let feet = body.bounds();
    feet.bottom() == obstacle.top
        && feet.left < obstacle.right()
        && obstacle.left < feet.right()
        && lands_on(surface, stance, body.previous_bottom <= obstacle.top)
}

/// Is `player` resting on `actor` this frame? The feet must touch or have
/// sunk into the actor's top by at most `band` pixels, and the player must
/// be within `tolerance` pixels of the actor's sides.
pub fn standing_on(player: &Rect, actor: &Rect, band: i32, tolerance: i32) -> bool {
    player.bottom() >= actor.top
        && player.bottom() <= actor.top + band
        && player.left >= actor.left - tolerance
        && player.right() <= actor.right() + tolerance
}

/// Is `player` pressed against either side of `wall`?
pub fn beside(player: &Rect, wall: &Rect, band: i32) -> bool {
    let overlap = player.bottom().min(wall.bottom()) - player.top.max(wall.top);
    if overlap <= band {
        return false;
    }
    (player.right() - wall.left).abs() <= band || (player.left - wall.right()).abs() <= band
}

/// Run the full per-frame pass. `band` is the contact slack in pixels.
pub fn resolve_frame(body: &mut Body, stance: Stance, env: &Surroundings, band: i32) -> Contacts {
    let mut contacts = Contacts::default();
    let half_width = body.width / 2;

    for (i, tile) in env.movable_tiles.iter().enumerate() {
        let rect = tile.bounds();
        if standing_on(&body.bounds(), &rect, band, half_width) {
            contacts.riding.push(i);
        }
        let contact = resolve(body, &rect, tile.collision(), stance);
        record(&mut contacts, contact, tile.collision());
    }

    for (i, wall) in env.wall_tiles.iter().enumerate() {
        let rect = wall.bounds();
        if beside(&body.bounds(), &rect, band) {
            contacts.walls.push(i);
        }
        let contact = resolve(body, &rect, wall.collision(), stance);
        record(&mut contacts, contact, wall.collision());
    }

    for (i, enemy) in env.enemies.iter().enumerate() {
        if !enemy.alive {
            continue;
        }
        let rect = enemy.bounds();
        if stance.thrusting_down {
            if standing_on(&body.bounds(), &rect, band, body.width) {
                contacts.enemies_stomped.push(i);
            }
        } else if standing_on(&body.bounds(), &rect, band, half_width) {
            contacts.enemies_under.push(i);
        }
        let contact = resolve(body, &rect, enemy.collision(), stance);
        record(&mut contacts, contact, enemy.collision());
    }

    let (left, top, right, bottom) = env.map.cell_range(&body.bounds());
    for y in top..=bottom {
        for x in left..=right {
            let Some(collision) = solid_cell(env.map, x, y) else {
                continue;
            };
            let contact = resolve(body, &env.map.bounds(x, y), collision, stance);
            record(&mut contacts, contact, collision);
        }
    }

    if !contacts.grounded && !stance.rising {
        if let Some(surface) = footing(body, stance, env) {
            record(&mut contacts, Contact::Landed, surface);
        }
    }

    body.previous_bottom = body.bounds().bottom();
    contacts
}

/// Collision of a grid cell the tile pass resolves against. Open cells and
/// ladder shaft cells below the top of their column are skipped.
fn solid_cell(map: &TileCollisionMap, x: i32, y: i32) -> Option<TileCollision> {
    let collision = map.classify(x, y);
    if !collision.is_obstacle() || (collision.is_ladder() && !map.is_ladder_top(x, y)) {
        return None;
    }
    Some(collision)
}

/// The surface the feet rest on without overlapping it, if any.
fn footing(body: &Body, stance: Stance, env: &Surroundings) -> Option<TileCollision> {
    let actors = env
        .movable_tiles
        .iter()
        .map(|t| (t.bounds(), t.collision()))
        .chain(env.wall_tiles.iter().map(|w| (w.bounds(), w.collision())))
        .chain(env.enemies.iter().filter(|e| e.alive).map(|e| (e.bounds(), e.collision())));
    for (rect, surface) in actors {
        if rests_on(body, &rect, surface, stance) {
            return Some(surface);
        }
    }

    let feet = body.bounds();
    let below = Rect::new(feet.left, feet.bottom(), feet.width, 1);
    let (left, row, right, _) = env.map.cell_range(&below);
    (left..=right).find_map(|x| {
        let surface = solid_cell(env.map, x, row)?;
        rests_on(body, &env.map.bounds(x, row), surface, stance).then_some(surface)
    })
}

fn record(contacts: &mut Contacts, contact: Contact, surface: TileCollision) {
    match contact {
        Contact::Landed => {
            contacts.grounded = true;
            contacts.landed_solid |= !surface.is_ladder();
        }
        Contact::Blocked(Axis::Horizontal) => contacts.blocked_x = true,
        Contact::Blocked(Axis::Vertical) => contacts.blocked_y = true,
        Contact::Clear | Contact::PassedThrough => {}
    }
}
