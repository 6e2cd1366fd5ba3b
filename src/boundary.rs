use nalgebra::DMatrix;

/// How the walls of the cubic box treat particles, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// Opposite faces are identified; coordinates live in `[0, L)`.
    Periodic { box_length: f64 },
    /// Hard walls. A particle whose surface crosses a wall is put back in
    /// contact with it and the normal velocity component is reversed and
    /// scaled by `restitution`.
    Reflective {
        box_length: f64,
        radius: f64,
        restitution: f64,
    },
}

/// A coordinate that a single periodic wrap could not bring back into the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Escape {
    pub particle: usize,
    pub axis: usize,
    pub coordinate: f64,
}

impl Boundary {
    pub fn box_length(&self) -> f64 {
        match *self {
            Boundary::Periodic { box_length } | Boundary::Reflective { box_length, .. } => {
                box_length
            }
        }
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, Boundary::Periodic { .. })
    }

    /// Enforce the boundary on `positions` (and `velocities` for hard walls).
    pub fn apply(
        &self,
        positions: &mut DMatrix<f64>,
        velocities: &mut DMatrix<f64>,
    ) -> Result<(), Escape> {
        match *self {
            Boundary::Periodic { box_length } => wrap_periodic(positions, box_length),
            Boundary::Reflective {
                box_length,
                radius,
                restitution,
            } => {
                reflect_walls(positions, velocities, box_length, radius, restitution);
                Ok(())
            }
        }
    }
}

/// Move every coordinate back into `[0, L)` by adding or subtracting `L` once.
fn wrap_periodic(positions: &mut DMatrix<f64>, box_length: f64) -> Result<(), Escape> {
    for particle in 0..positions.ncols() {
        for axis in 0..positions.nrows() {
            let x = &mut positions[(axis, particle)];
            if *x < 0.0 {
                *x += box_length;
                // a tiny negative offset can round up to exactly L
                if *x >= box_length {
                    *x = 0.0;
                }
            } else if *x >= box_length {
                *x -= box_length;
            }

            if !(0.0..box_length).contains(x) {
                return Err(Escape {
                    particle,
                    axis,
                    coordinate: *x,
                });
            }
        }
    }
    Ok(())
}

fn reflect_walls(
    positions: &mut DMatrix<f64>,
    velocities: &mut DMatrix<f64>,
    box_length: f64,
    radius: f64,
    restitution: f64,
) {
    let lo = radius;
    let hi = box_length - radius;
    for (x, v) in positions.iter_mut().zip(velocities.iter_mut()) {
        if *x < lo {
            *x = lo;
            *v *= -restitution;
        } else if *x > hi {
            *x = hi;
            *v *= -restitution;
        }
    }
}
