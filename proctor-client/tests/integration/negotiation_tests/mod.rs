mod test_early_candidates_dropped_on_leave;
mod test_new_offer_replaces_push_link;
mod test_proctor_camera_push;
mod test_refused_offer_id_is_retired;
