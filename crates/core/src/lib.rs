pub mod shared {
    pub mod constants;
    pub mod face_box;
    pub mod frame;
    pub mod model_resolver;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod image_reader;
        pub mod video_reader;
    }
    pub mod infrastructure;
}

pub mod sampling {
    pub mod domain {
        pub mod frame_sampler;
        pub mod sampling_stride;
    }
}

pub mod recognition {
    pub mod domain {
        pub mod embedding;
        pub mod face_encoder;
        pub mod face_matcher;
        pub mod reference_embedding;
    }
    pub mod infrastructure;
}

pub mod presence {
    pub mod domain {
        pub mod appearance_interval;
        pub mod presence_tracker;
    }
}

pub mod pipeline {
    pub mod find_appearances_use_case;
    pub mod find_config;
    pub mod find_error;
    pub mod pipeline_logger;
}

pub mod jobs {
    pub mod domain {
        pub mod run_result;
        pub mod run_store;
    }
    pub mod infrastructure;
    pub mod job_facade;
}
