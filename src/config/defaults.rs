pub(super) const MAX_OVERFETCH_MULTIPLIER: usize = 100;

pub(super) fn default_k() -> usize {
    10
}

pub(super) fn default_overfetch_floor() -> usize {
    50
}

pub(super) fn default_overfetch_multiplier() -> usize {
    5
}

pub(super) fn default_max_nb_connection() -> usize {
    16
}

pub(super) fn default_ef_construction() -> usize {
    200
}

pub(super) fn default_ef_search() -> usize {
    64
}

pub(super) fn default_max_layer() -> usize {
    16
}

pub(super) fn default_max_image_bytes() -> usize {
    20 * 1024 * 1024
}
