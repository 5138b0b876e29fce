use walker_core::input::Key;
use winit::keyboard::KeyCode;

pub fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::KeyP => Some(Key::P),
        _ => None,
    }
}
