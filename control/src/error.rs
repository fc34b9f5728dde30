use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    #[error("room {0} is not occupied")]
    RoomNotOccupied(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not in simulation mode")]
    NotInSimulation,
}
