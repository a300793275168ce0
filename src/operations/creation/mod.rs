mod make_box;
mod make_grid;
mod make_tube;
mod make_uv_sphere;

pub use make_box::MakeBox;
pub use make_grid::MakeGrid;
pub use make_tube::MakeTube;
pub use make_uv_sphere::MakeUvSphere;
