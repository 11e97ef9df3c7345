mod grid;
mod tiles;
