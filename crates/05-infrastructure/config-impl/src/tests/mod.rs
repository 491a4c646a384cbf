mod remote_source_tests;
