mod ui_manager_tests;
