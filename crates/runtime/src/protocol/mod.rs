//! Session wire protocol: JSON messages and room codes.

mod messages;
mod room_code;

pub use messages::{
    ClientRequest, RequestEnvelope, ResponseBody, RevealedMoves, Role, RoomStatus, ServerMessage,
};
pub use room_code::RoomCode;
