//! Static room inventory for the reference hotel: four floors of ten
//! rooms, with floor-1 pricing split between standard and deluxe.

use room::model::Room;

pub const FLOORS: u8 = 4;
pub const ROOMS_PER_FLOOR: u8 = 10;

const AMBIENT_DEFAULT: f64 = 28.0;

/// Build the standard 4×10 inventory with floor-based pricing.
pub fn standard_rooms() -> Vec<Room> {
    let mut rooms = Vec::with_capacity((FLOORS * ROOMS_PER_FLOOR) as usize);

    for floor in 1..=FLOORS {
        for n in 1..=ROOMS_PER_FLOOR {
            let id = format!("{floor}{n:02}");
            let (room_type, nightly_price, deposit) = if floor == 1 {
                if n > 8 {
                    ("deluxe king", 350.0, 500.0)
                } else {
                    ("standard twin", 220.0, 500.0)
                }
            } else {
                ("standard twin", 220.0, 0.0)
            };

            rooms.push(Room::new(id, floor, room_type, nightly_price, deposit, AMBIENT_DEFAULT));
        }
    }

    rooms
}

/// Demo profile: five hot rooms on the cooling side and five cold rooms on
/// the heating side, each with its own nightly price.
pub fn apply_demo_profile(rooms: &mut [Room]) {
    let overrides: [(&str, f64, f64); 10] = [
        ("101", 32.0, 100.0),
        ("102", 28.0, 125.0),
        ("103", 30.0, 150.0),
        ("104", 29.0, 200.0),
        ("105", 35.0, 100.0),
        ("106", 10.0, 100.0),
        ("107", 15.0, 125.0),
        ("108", 18.0, 150.0),
        ("109", 12.0, 200.0),
        ("110", 14.0, 100.0),
    ];

    for (id, temp, price) in overrides {
        if let Some(room) = rooms.iter_mut().find(|r| r.id == id) {
            room.initial_temp = temp;
            room.current_temp = temp;
            room.nightly_price = price;
        }
    }
}
