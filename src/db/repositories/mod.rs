mod location_readings;
